// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, updates, copies, and world-space queries.

use alloc::vec;
use alloc::vec::Vec;

use glam::DAffine3;

use crate::types::{Aabb, InstanceId, LocalInstance};

/// Owned hierarchy of mesh instances.
///
/// Instances are stored in generational slots. Every instance has at most one
/// parent; sharing is expressed by [copying](SceneTree::copy_subtree), never
/// by aliasing, so each occurrence keeps its own transform.
pub struct SceneTree<M> {
    slots: Vec<Option<Slot<M>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    live: usize,
}

impl<M> core::fmt::Debug for SceneTree<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SceneTree")
            .field("slots_total", &self.slots.len())
            .field("instances_alive", &self.live)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<M> Default for SceneTree<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Slot<M> {
    generation: u32,
    parent: Option<InstanceId>,
    children: Vec<InstanceId>,
    local: LocalInstance<M>,
}

impl<M> SceneTree<M> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the tree holds no instances.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Insert a new instance as the last child of `parent` (or as a root if `None`).
    ///
    /// A stale `parent` is ignored and the instance becomes a root.
    pub fn insert(&mut self, parent: Option<InstanceId>, local: LocalInstance<M>) -> InstanceId {
        let slot = |generation| Slot {
            generation,
            parent: None,
            children: Vec::new(),
            local,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(slot(generation));
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.slots.push(Some(slot(generation)));
            self.generations.push(generation);
            (self.slots.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "InstanceId uses 32-bit indices by design."
        )]
        let id = InstanceId::new(idx as u32, generation);
        self.live += 1;
        if let Some(p) = parent.filter(|p| self.is_alive(*p)) {
            self.link_parent(id, p);
        }
        id
    }

    /// Remove an instance and its whole subtree.
    pub fn remove(&mut self, id: InstanceId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.slot(id).and_then(|s| s.parent) {
            self.unlink_parent(id, parent);
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(slot) = self.slots[next.idx()].take() {
                stack.extend(slot.children);
                self.free_list.push(next.idx());
                self.live -= 1;
            }
        }
    }

    /// Move `id` under `new_parent`, or make it a root.
    ///
    /// Returns `false` if either id is stale or if `new_parent` lies inside the
    /// subtree of `id`.
    pub fn reparent(&mut self, id: InstanceId, new_parent: Option<InstanceId>) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        if let Some(p) = new_parent {
            if !self.is_alive(p) || self.is_ancestor_or_self(id, p) {
                return false;
            }
        }
        if let Some(parent) = self.slot(id).and_then(|s| s.parent) {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
        true
    }

    /// Replace the local transform.
    pub fn set_local_transform(&mut self, id: InstanceId, transform: DAffine3) {
        if let Some(s) = self.slot_mut(id) {
            s.local.transform = transform;
        }
    }

    /// Show or hide the renderable unit.
    pub fn set_drawn(&mut self, id: InstanceId, drawn: bool) {
        if let Some(s) = self.slot_mut(id) {
            s.local.drawn = drawn;
        }
    }

    /// Local data of a live instance.
    pub fn get(&self, id: InstanceId) -> Option<&LocalInstance<M>> {
        self.slot(id).map(|s| &s.local)
    }

    /// Mutable local data of a live instance.
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut LocalInstance<M>> {
        self.slot_mut(id).map(|s| &mut s.local)
    }

    /// Parent of a live instance.
    pub fn parent(&self, id: InstanceId) -> Option<InstanceId> {
        self.slot(id).and_then(|s| s.parent)
    }

    /// Children in attachment order; empty if `id` is stale.
    pub fn children(&self, id: InstanceId) -> &[InstanceId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    /// Returns true if `id` refers to a live instance.
    pub fn is_alive(&self, id: InstanceId) -> bool {
        self.slot(id).is_some()
    }

    /// Instances without a parent.
    pub fn roots(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| match s {
            Some(s) if s.parent.is_none() =>
            {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "InstanceId uses 32-bit indices by design."
                )]
                Some(InstanceId::new(i as u32, s.generation))
            }
            _ => None,
        })
    }

    /// Pre-order listing of the subtree rooted at `id`, `id` first.
    pub fn subtree(&self, id: InstanceId) -> Vec<InstanceId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Number of instances in the subtree rooted at `id`, `id` included.
    pub fn subtree_len(&self, id: InstanceId) -> usize {
        self.subtree(id).len()
    }

    /// Composition of local transforms from the root down to `id`.
    pub fn world_transform(&self, id: InstanceId) -> Option<DAffine3> {
        let mut slot = self.slot(id)?;
        let mut world = slot.local.transform;
        while let Some(parent) = slot.parent {
            slot = self.slot(parent)?;
            world = slot.local.transform * world;
        }
        Some(world)
    }

    /// World-space bounds of the instance's own mesh, if it has any.
    pub fn world_bounds(&self, id: InstanceId) -> Option<Aabb> {
        let local = self.get(id)?.local_bounds?;
        Some(local.transformed(&self.world_transform(id)?))
    }

    fn slot(&self, id: InstanceId) -> Option<&Slot<M>> {
        self.slots
            .get(id.idx())?
            .as_ref()
            .filter(|s| s.generation == id.1)
    }

    fn slot_mut(&mut self, id: InstanceId) -> Option<&mut Slot<M>> {
        self.slots
            .get_mut(id.idx())?
            .as_mut()
            .filter(|s| s.generation == id.1)
    }

    fn is_ancestor_or_self(&self, ancestor: InstanceId, mut id: InstanceId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent(id) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    fn link_parent(&mut self, id: InstanceId, parent: InstanceId) {
        if let Some(p) = self.slot_mut(parent) {
            p.children.push(id);
        }
        if let Some(s) = self.slot_mut(id) {
            s.parent = Some(parent);
        }
    }

    fn unlink_parent(&mut self, id: InstanceId, parent: InstanceId) {
        if let Some(p) = self.slot_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(s) = self.slot_mut(id) {
            s.parent = None;
        }
    }
}

impl<M: Clone> SceneTree<M> {
    /// Deep-copy the subtree rooted at `src` and attach the copy under `new_parent`.
    ///
    /// Every instance in the copy is a fresh slot with its own local data, so
    /// later edits to either subtree never affect the other. Returns `None` if
    /// `src` is stale.
    pub fn copy_subtree(
        &mut self,
        src: InstanceId,
        new_parent: Option<InstanceId>,
    ) -> Option<InstanceId> {
        // Snapshot first so that copying into the source subtree terminates.
        let order = self.subtree(src);
        if order.is_empty() {
            return None;
        }
        let mut copies: Vec<InstanceId> = Vec::with_capacity(order.len());
        for (i, &old) in order.iter().enumerate() {
            let local = self.get(old)?.clone();
            let parent = if i == 0 {
                new_parent
            } else {
                let old_parent = self.parent(old)?;
                let pos = order[..i].iter().rposition(|&o| o == old_parent)?;
                Some(copies[pos])
            };
            copies.push(self.insert(parent, local));
        }
        copies.first().copied()
    }
}
