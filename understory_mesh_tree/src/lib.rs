// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_mesh_tree --heading-base-level=0

//! Understory Mesh Tree: the built side of a placement graph.
//!
//! A placement graph shares volumes; a renderer does not. This crate holds the
//! result of building a graph: an owned hierarchy in which every occurrence of
//! a shared volume is its own instance with its own transform.
//!
//! - [`SceneTree`]: generational slots with parent/child links, local
//!   transforms, and world-space queries composed along the parent chain.
//! - [`LocalInstance`]: per-instance data (transform, drawn flag, opacity, a
//!   back-reference to the source [`NodeId`](understory_placement::NodeId),
//!   and an optional mesh handle `M` with its local [`Aabb`]).
//! - [`SceneTree::copy_subtree`]: structural deep copy, used when a shared
//!   subtree is reused.
//!
//! ## Calibration
//!
//! Once a scene is built, [`calibrate`] finds its bounds and derives a
//! [`CameraSetup`]: overall scale, clipping planes and a default camera
//! position. [`BoundsPolicy::FirstMatch`] takes the first drawn box found
//! depth-first; [`BoundsPolicy::Union`] is the strict alternative.
//!
//! ## Example
//!
//! ```
//! use glam::{DAffine3, DVec3};
//! use understory_mesh_tree::{
//!     Aabb, BoundsPolicy, LocalInstance, ScaleSource, SceneTree, calibrate,
//! };
//!
//! let mut tree: SceneTree<&str> = SceneTree::new();
//! let root = tree.insert(None, LocalInstance { drawn: false, ..Default::default() });
//! let slab = tree.insert(
//!     Some(root),
//!     LocalInstance {
//!         transform: DAffine3::from_translation(DVec3::new(0.0, 0.0, 4.0)),
//!         mesh: Some("slab"),
//!         local_bounds: Some(Aabb::from_center_half_extents(DVec3::ZERO, DVec3::ONE)),
//!         ..Default::default()
//!     },
//! );
//!
//! // Reuse the slab elsewhere; the copy is independent.
//! let copy = tree.copy_subtree(slab, Some(root)).unwrap();
//! tree.set_local_transform(copy, DAffine3::from_translation(DVec3::new(0.0, 0.0, -4.0)));
//! assert_eq!(tree.children(root).len(), 2);
//!
//! let camera = calibrate(&tree, root, BoundsPolicy::FirstMatch, ScaleSource::Built);
//! assert_eq!(camera.scale, 20.0);
//! assert_eq!(camera.far, 10_000.0);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod calibrate;
mod tree;
mod types;

pub use calibrate::{BoundsPolicy, CameraSetup, ScaleSource, calibrate, scene_bounds};
pub use tree::SceneTree;
pub use types::{Aabb, InstanceId, LocalInstance};
