// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the mesh tree: instance identifiers, local instance data, and boxes.

use alloc::string::String;

use glam::{DAffine3, DVec3};
use understory_placement::NodeId;

/// Identifier for an instance in a [`SceneTree`](crate::SceneTree).
///
/// A slot index plus a generation counter. The generation is bumped when a
/// freed slot is reused, so a stale `InstanceId` never aliases a newer instance.
/// Use [`SceneTree::is_alive`](crate::SceneTree::is_alive) to check liveness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct InstanceId(pub(crate) u32, pub(crate) u32);

impl InstanceId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Per-instance data owned by the tree.
///
/// Each instance carries only its local transform. World placement is the
/// composition along the parent chain, see [`SceneTree::world_transform`](crate::SceneTree::world_transform).
#[derive(Clone, Debug)]
pub struct LocalInstance<M> {
    /// Display name, usually the source node's name.
    pub name: String,
    /// Transform relative to the parent instance.
    pub transform: DAffine3,
    /// Whether the renderable unit is shown.
    pub drawn: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Placement this instance was built from, if any.
    pub source: Option<NodeId>,
    /// Renderable unit, if one was built.
    pub mesh: Option<M>,
    /// Bounds of `mesh` in local coordinates.
    pub local_bounds: Option<Aabb>,
}

impl<M> Default for LocalInstance<M> {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: DAffine3::IDENTITY,
            drawn: true,
            opacity: 1.0,
            source: None,
            mesh: None,
            local_bounds: None,
        }
    }
}

/// Axis-aligned bounding box in 3D.
///
/// A box with `max < min` on any axis is empty; see [`Aabb::EMPTY`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Aabb {
    /// The empty box. Its union with any box is that box.
    pub const EMPTY: Self = Self {
        min: DVec3::INFINITY,
        max: DVec3::NEG_INFINITY,
    };

    /// Create a box from its corners.
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Box centred on `center` with half extents `half`.
    pub fn from_center_half_extents(center: DVec3, half: DVec3) -> Self {
        Self::new(center - half, center + half)
    }

    /// Whether the box is empty or inverted on any axis.
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Smallest box containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Bounds of this box after an affine transform, taken over its eight corners.
    #[must_use]
    pub fn transformed(&self, affine: &DAffine3) -> Self {
        if self.is_empty() {
            return *self;
        }
        let mut out = Self::EMPTY;
        for i in 0..8_u8 {
            let corner = DVec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = affine.transform_point3(corner);
            out.min = out.min.min(p);
            out.max = out.max.max(p);
        }
        out
    }

    /// Largest absolute coordinate of the maximum corner.
    pub fn max_abs_extent(&self) -> f64 {
        self.max.abs().max_element()
    }
}
