// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_placement --heading-base-level=0

//! Understory Placement: placement graphs of shared volumes.
//!
//! A detector or CAD description is rarely a tree. The same volume (a crystal,
//! a module, a bolt) is defined once and placed many times, and those placements
//! nest. This crate models that structure as a directed acyclic graph and
//! answers the questions a scene builder needs before it starts:
//!
//! - How many distinct placements refer to each volume?
//! - Which volumes are shared, so that every occurrence needs its own built copy?
//! - How big is the fully expanded tree, level by level?
//!
//! ## Model
//!
//! - [`Volume`]: a named shape definition with material, visibility bits and an
//!   ordered list of child placements.
//! - [`Node`]: one placement of a volume, with an optional [`Transform`] and,
//!   for divided volumes, a [`Division`] cell.
//! - [`PlacementGraph`]: owns volumes and nodes. Append-only, except for
//!   visibility edits which bump [`PlacementGraph::revision`].
//!
//! The shape descriptor type `S` is opaque here; it is interpreted by whatever
//! turns shapes into renderable units.
//!
//! ## Analysis
//!
//! - [`resolve_shared_subtrees`] computes reference counts and marks the
//!   volumes that need independent instancing. It iterates to a fixed point
//!   with a configurable safety cap ([`ResolveOptions`]).
//! - [`count_nodes`] reports per-level occurrence counts of the expanded tree,
//!   useful for picking a depth limit before building anything
//!   ([`NodeCount::depth_for_ceiling`]).
//!
//! Both are read-only and can be called at any time.
//!
//! ## Example
//!
//! ```
//! use understory_placement::{
//!     count_nodes, resolve_shared_subtrees, Node, PlacementGraph, ResolveOptions, Volume,
//! };
//!
//! let mut graph: PlacementGraph<&str> = PlacementGraph::new();
//! let hall = graph.add_volume(Volume::new("hall", Some("box")));
//! let module = graph.add_volume(Volume::new("module", Some("box")));
//! let crystal = graph.add_volume(Volume::new("crystal", Some("trd")));
//! let root = graph.add_root(hall).unwrap();
//!
//! graph.place(hall, Node::new("module_0", module)).unwrap();
//! graph.place(hall, Node::new("module_1", module)).unwrap();
//! for i in 0..4 {
//!     graph.place(module, Node::new(format!("crystal_{i}"), crystal)).unwrap();
//! }
//!
//! let counts = count_nodes(&graph, root).unwrap();
//! assert_eq!(counts.per_level, vec![1, 2, 8]);
//!
//! let resolution = resolve_shared_subtrees(&graph, root, ResolveOptions::default()).unwrap();
//! assert_eq!(resolution.reference_count(module), 2);
//! assert!(resolution.needs_independent_processing(module));
//! assert!(resolution.is_processed(hall));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod count;
mod error;
mod graph;
mod resolve;
mod types;

pub use count::{NodeCount, count_nodes};
pub use error::GraphError;
pub use graph::{Node, PlacementGraph, Volume};
pub use resolve::{
    DEFAULT_MAX_ITERATIONS, Resolution, ResolveOptions, ResolveSummary, resolve_shared_subtrees,
};
pub use types::{Division, Material, NodeId, Pattern, Transform, VisFlags, VolumeId};
