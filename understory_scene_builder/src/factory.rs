// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The port through which shapes become renderable units.

use thiserror::Error;
use understory_mesh_tree::Aabb;

/// Material parameters resolved for one instance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MeshMaterial {
    /// Colour index, taken from the volume's line colour.
    pub color: u16,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Whether the unit must be blended.
    pub transparent: bool,
    /// Whether the unit is drawn at all.
    pub visible: bool,
}

/// Failure to build a renderable unit for one shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// The shape kind has no mesh implementation.
    #[error("unsupported shape `{0}`")]
    UnsupportedShape(String),
    /// The shape parameters do not describe a solid.
    #[error("degenerate shape: {0}")]
    Degenerate(String),
}

/// Creates renderable units from shape descriptors.
///
/// Implemented by the rendering side. The builder calls [`MeshFactory::create_mesh`]
/// once per freshly built instance; shared subtrees are reused by copying
/// already created meshes, which is why `Mesh` must be `Clone`.
pub trait MeshFactory<S> {
    /// Handle to a renderable unit.
    type Mesh: Clone;

    /// Build a unit for `shape` with `material`.
    fn create_mesh(&mut self, shape: &S, material: &MeshMaterial) -> Result<Self::Mesh, MeshError>;

    /// Bounds of `mesh` in its local coordinates, if known.
    fn local_bounds(&self, mesh: &Self::Mesh) -> Option<Aabb>;
}
