// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scene_builder --heading-base-level=0

//! Understory Scene Builder: time-sliced construction of mesh hierarchies.
//!
//! Expanding a large placement graph into renderable instances can take far
//! longer than one frame. [`SceneBuilder`] does the expansion as an explicit
//! depth-first work stack that can stop after any node and resume later, so a
//! host can interleave building with rendering and input.
//!
//! ## Flow
//!
//! 1. [`SceneBuilder::start`] resolves shared subtrees in the graph
//!    (see [`understory_placement::resolve_shared_subtrees`]).
//! 2. [`SceneBuilder::run_for`] visits nodes until a time slice is used up.
//!    Each visited node becomes a [`LocalInstance`](understory_mesh_tree::LocalInstance)
//!    in the target [`SceneTree`](understory_mesh_tree::SceneTree), with a mesh
//!    created through the host's [`MeshFactory`].
//! 3. [`SceneBuilder::finish`] (or [`SceneBuilder::cancel`]) returns a
//!    [`BuildReport`] with counters, warnings, and a calibrated camera.
//!
//! A node placed under a shared volume is built once; later occurrences with
//! the same remaining depth are structural copies of the first.
//!
//! Expansion stops early at the depth limit, the node budget, or the total time
//! limit in [`BuildOptions`]. Nodes whose placement or shape cannot be handled are
//! skipped with their subtree and reported as [`BuildWarning`]s; a build never
//! fails because of one node.
//!
//! ## Example
//!
//! ```
//! use glam::DVec3;
//! use understory_mesh_tree::{Aabb, SceneTree};
//! use understory_placement::{Node, PlacementGraph, Transform, Volume};
//! use understory_scene_builder::{
//!     build_scene, BuildOptions, MeshError, MeshFactory, MeshMaterial,
//! };
//!
//! /// Meshes are just the half extents of boxes.
//! struct Boxes;
//!
//! impl MeshFactory<DVec3> for Boxes {
//!     type Mesh = DVec3;
//!
//!     fn create_mesh(&mut self, half: &DVec3, _: &MeshMaterial) -> Result<DVec3, MeshError> {
//!         Ok(*half)
//!     }
//!
//!     fn local_bounds(&self, half: &DVec3) -> Option<Aabb> {
//!         Some(Aabb::from_center_half_extents(DVec3::ZERO, *half))
//!     }
//! }
//!
//! let mut graph = PlacementGraph::new();
//! let hall = graph.add_volume(Volume::new("hall", Some(DVec3::splat(50.0))));
//! let layer = graph.add_volume(Volume::new("layer", Some(DVec3::new(5.0, 5.0, 0.5))));
//! let root = graph.add_root(hall).unwrap();
//! for z in [-2.0, 0.0, 2.0] {
//!     graph
//!         .place(hall, Node::new("layer", layer).with_transform(Transform::from_translation(DVec3::Z * z)))
//!         .unwrap();
//! }
//!
//! let mut tree = SceneTree::new();
//! let report = build_scene(&graph, root, &mut tree, &mut Boxes, BuildOptions::default()).unwrap();
//!
//! assert_eq!(tree.len(), 4);
//! assert!(report.warnings.is_empty());
//! assert_eq!(report.camera.scale, 20.0);
//! ```

mod builder;
mod factory;
mod options;
mod report;

pub use builder::{SceneBuilder, build_scene};
pub use factory::{MeshError, MeshFactory, MeshMaterial};
pub use options::{
    BuildOptions, DebugFlags, DepthRequest, DrawOptions, DrawPolicy, LIMIT_CEILING, OptionsError,
    UNBOUNDED_DEPTH,
};
pub use report::{BuildProgress, BuildReport, BuildState, BuildWarning, Cutoff};
