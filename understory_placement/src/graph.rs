// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The placement graph: volumes, the nodes that place them, and read-only accessors.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::GraphError;
use crate::types::{Division, Material, NodeId, Transform, VisFlags, VolumeId};

/// A named shape definition that can be placed many times.
///
/// `S` is the shape descriptor. It is opaque to this crate and interpreted by
/// whatever builds renderable units from it.
#[derive(Clone, Debug)]
pub struct Volume<S> {
    /// Display name.
    pub name: String,
    /// Shape descriptor; `None` marks an assembly with nothing to draw itself.
    pub shape: Option<S>,
    /// Material, if any.
    pub material: Option<Material>,
    /// Visibility attribute bits.
    pub vis: VisFlags,
    /// Line colour index, used for outlines and as the default fill colour.
    pub line_color: u16,
    children: Vec<NodeId>,
}

impl<S> Volume<S> {
    /// A volume with default visibility and no material or children.
    pub fn new(name: impl Into<String>, shape: Option<S>) -> Self {
        Self {
            name: name.into(),
            shape,
            material: None,
            vis: VisFlags::default(),
            line_color: 0,
            children: Vec::new(),
        }
    }

    /// Set the material.
    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the visibility bits.
    #[must_use]
    pub fn with_vis(mut self, vis: VisFlags) -> Self {
        self.vis = vis;
        self
    }

    /// Set the line colour index.
    #[must_use]
    pub fn with_line_color(mut self, color: u16) -> Self {
        self.line_color = color;
        self
    }

    /// Placements inside this volume, in drawing order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// One placement of a volume inside a parent volume.
#[derive(Clone, Debug)]
pub struct Node {
    /// Display name.
    pub name: String,
    /// The placed volume.
    pub volume: VolumeId,
    /// Explicit placement; identity when absent.
    pub transform: Option<Transform>,
    /// Division cell this node represents, if the parent is divided.
    pub division: Option<Division>,
}

impl Node {
    /// Place `volume` with an identity transform.
    pub fn new(name: impl Into<String>, volume: VolumeId) -> Self {
        Self {
            name: name.into(),
            volume,
            transform: None,
            division: None,
        }
    }

    /// Set the explicit transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Mark this node as a cell of a division.
    #[must_use]
    pub fn with_division(mut self, division: Division) -> Self {
        self.division = Some(division);
        self
    }

    /// Local placement of this node.
    ///
    /// Division cells combine the explicit transform with the pattern: for an
    /// azimuthal pattern the in-plane rotation coefficients are replaced by the
    /// cell's angle and the rest of the transform is kept.
    pub fn resolve_transform(&self) -> Result<Transform, GraphError> {
        let mut transform = self.transform.unwrap_or(Transform::IDENTITY);
        let Some(division) = &self.division else {
            return Ok(transform);
        };
        let Some((sin, cos)) = division.pattern.cyl_phi_sin_cos(division.index) else {
            return Err(GraphError::UnsupportedPattern {
                node: self.name.clone(),
                pattern: division.pattern.name().into(),
            });
        };
        let r = &mut transform.rotation;
        r.x_axis.x = cos;
        r.y_axis.x = -sin;
        r.x_axis.y = sin;
        r.y_axis.y = cos;
        Ok(transform)
    }
}

/// Directed acyclic graph of volume placements.
///
/// Volumes own an ordered list of child nodes; each node refers to exactly one
/// volume, and many nodes may refer to the same volume. The graph is append-only.
/// Visibility bits can be edited, which bumps [`PlacementGraph::revision`] so that
/// derived data such as a [`Resolution`](crate::Resolution) can detect staleness.
#[derive(Clone, Debug)]
pub struct PlacementGraph<S> {
    volumes: Vec<Volume<S>>,
    nodes: Vec<Node>,
    revision: u64,
}

impl<S> Default for PlacementGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> PlacementGraph<S> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            volumes: Vec::new(),
            nodes: Vec::new(),
            revision: 0,
        }
    }

    /// Add a volume. Children are attached later with [`Self::place`].
    pub fn add_volume(&mut self, volume: Volume<S>) -> VolumeId {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "VolumeId uses 32-bit indices by design."
        )]
        let id = VolumeId(self.volumes.len() as u32);
        self.volumes.push(volume);
        self.revision += 1;
        id
    }

    /// Add a node that is not owned by any volume.
    ///
    /// Used for top-level placements; see [`Self::add_root`].
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.volume(node.volume).is_none() {
            return Err(GraphError::UnknownVolume(node.volume));
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.revision += 1;
        Ok(id)
    }

    /// Wrap `volume` in an unowned identity placement named `TopLevel`.
    pub fn add_root(&mut self, volume: VolumeId) -> Result<NodeId, GraphError> {
        self.add_node(Node::new("TopLevel", volume))
    }

    /// Place `node` as the last child of `parent`.
    pub fn place(&mut self, parent: VolumeId, node: Node) -> Result<NodeId, GraphError> {
        if self.volume(parent).is_none() {
            return Err(GraphError::UnknownVolume(parent));
        }
        let id = self.add_node(node)?;
        self.volumes[parent.idx()].children.push(id);
        Ok(id)
    }

    /// Flip visibility bits of a volume. Returns `false` if the volume is unknown.
    pub fn toggle_visibility(&mut self, volume: VolumeId, bits: VisFlags) -> bool {
        let Some(v) = self.volumes.get_mut(volume.idx()) else {
            return false;
        };
        v.vis = v.vis.toggled(bits);
        self.revision += 1;
        true
    }

    /// Replace the visibility bits of a volume. Returns `false` if the volume is unknown.
    pub fn set_visibility(&mut self, volume: VolumeId, vis: VisFlags) -> bool {
        let Some(v) = self.volumes.get_mut(volume.idx()) else {
            return false;
        };
        v.vis = vis;
        self.revision += 1;
        true
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of volumes.
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a volume.
    pub fn volume(&self, id: VolumeId) -> Option<&Volume<S>> {
        self.volumes.get(id.idx())
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    /// Volume placed by `node`.
    pub fn volume_of(&self, node: NodeId) -> Option<VolumeId> {
        self.node(node).map(|n| n.volume)
    }

    /// Child placements reached through `node`'s volume; empty if none or unknown.
    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        self.volume_of(node)
            .and_then(|v| self.volume(v))
            .map(|v| v.children.as_slice())
            .unwrap_or(&[])
    }

    /// Explicit transform of `node`, identity if absent or unknown.
    pub fn transform_of(&self, node: NodeId) -> Transform {
        self.node(node)
            .and_then(|n| n.transform)
            .unwrap_or(Transform::IDENTITY)
    }

    /// Shape descriptor of `volume`.
    pub fn shape_of(&self, volume: VolumeId) -> Option<&S> {
        self.volume(volume).and_then(|v| v.shape.as_ref())
    }

    /// Material of `volume`.
    pub fn material_of(&self, volume: VolumeId) -> Option<&Material> {
        self.volume(volume).and_then(|v| v.material.as_ref())
    }

    /// Visibility bits of `volume`; empty if unknown.
    pub fn visibility_bits(&self, volume: VolumeId) -> VisFlags {
        self.volume(volume)
            .map(|v| v.vis)
            .unwrap_or(VisFlags::empty())
    }
}
