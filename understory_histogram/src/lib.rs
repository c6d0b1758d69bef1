// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_histogram --heading-base-level=0

//! Understory Histogram: binned data as 3D solids.
//!
//! Histograms are drawn inside a cube of half-width [`DEFAULT_SIZE`]: x and y
//! span `[-size, size]` and z spans `[0, 2 * size]`. Each [`Axis`] maps into
//! that cube linearly or logarithmically; a log axis with a non-positive
//! range falls back to a small positive minimum instead of failing.
//!
//! - [`project_bins`]: 3D histograms become boxes or spheres whose size is
//!   proportional to content relative to the maximum.
//! - [`project_columns`]: 1D and 2D histograms become columns standing on `z = 0`.
//! - [`project_points`]: point clouds are thinned to about [`POINT_BUDGET`]
//!   markers ([`thinning_step`]).
//! - [`populate`]: projected bins are attached to a
//!   [`SceneTree`](understory_mesh_tree::SceneTree) through the same
//!   [`MeshFactory`](understory_scene_builder::MeshFactory) port the scene
//!   builder uses.
//!
//! Bins at or below a content floor are skipped; by default the floor is the
//! global minimum found by [`Histogram::scan`]. [`Histogram::stats`] gives the
//! usual entries, integral, mean and RMS.
//!
//! ## Example
//!
//! ```
//! use understory_histogram::{project_bins, Axis, BinShape, Histogram, ProjectOptions};
//!
//! let axis = Axis::linear(2, 0.0, 1.0);
//! let mut contents = vec![0.0; 8];
//! contents[7] = 3.0;
//! let hist = Histogram::new(vec![axis; 3], contents).unwrap();
//!
//! let bins = project_bins(&hist, &ProjectOptions::default()).unwrap();
//! assert_eq!(bins.len(), 1);
//! assert_eq!(bins[0].index, [1, 1, 1]);
//! assert!(matches!(bins[0].shape, BinShape::Box { .. }));
//! ```

mod axis;
mod error;
mod histogram;
mod populate;
mod project;

pub use axis::{Axis, AxisMapping, AxisScale, LOG_MIN_FRACTION};
pub use error::HistError;
pub use histogram::{Bin, ContentRange, Histogram, Stats};
pub use populate::{Populated, populate};
pub use project::{
    BinPlacement, BinShape, BinStyle, DEFAULT_SIZE, POINT_BUDGET, ProjectOptions, Projection,
    project_bins, project_columns, project_points, thin_points, thinning_step,
};
