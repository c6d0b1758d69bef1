// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Progress, warnings, and the final report of a build session.

use std::time::Duration;

use thiserror::Error;
use understory_mesh_tree::{CameraSetup, InstanceId};
use understory_placement::{GraphError, NodeId, ResolveSummary};

use crate::factory::MeshError;

/// Where a session stands between calls to [`SceneBuilder::run_for`](crate::SceneBuilder::run_for).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuildState {
    /// Started; nothing visited yet.
    Idle,
    /// Work remains; call `run_for` again.
    Suspended,
    /// The work stack is empty or a cutoff stopped expansion.
    Complete,
}

/// Why expansion stopped before the work stack emptied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cutoff {
    /// The node-visit ceiling was reached.
    NodeBudget,
    /// The total time limit was reached.
    TimeLimit,
}

/// Counters reported after every slice.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildProgress {
    /// Nodes visited so far.
    pub visits: usize,
    /// Instances built with a fresh mesh.
    pub built: usize,
    /// Subtrees reused by structural copy.
    pub copied: usize,
    /// Nodes skipped because of a warning.
    pub skipped: usize,
    /// Frames left on the work stack.
    pub pending_frames: usize,
}

/// A recoverable problem met during a build.
///
/// None of these abort the session: the offending node is skipped, or the
/// resolver result is used as far as it got.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildWarning {
    /// Shared-subtree resolution hit its pass cap.
    #[error("shared-subtree resolution stopped after {iterations} passes without converging")]
    ResolverCap {
        /// Passes performed.
        iterations: u32,
    },
    /// The graph has a cycle below the build root.
    #[error("placement graph has a cycle below the build root")]
    Cycle,
    /// The node's placement could not be resolved.
    #[error("skipped node `{name}`: {source}")]
    Placement {
        /// The skipped node.
        node: NodeId,
        /// Its display name.
        name: String,
        /// Underlying error.
        source: GraphError,
    },
    /// The mesh factory refused the node's shape.
    #[error("skipped node `{name}`: {source}")]
    Mesh {
        /// The skipped node.
        node: NodeId,
        /// Its display name.
        name: String,
        /// Underlying error.
        source: MeshError,
    },
}

/// Outcome of a finished or cancelled session.
#[derive(Clone, Debug)]
pub struct BuildReport {
    /// The instance built for the root node, if it was built.
    pub root: Option<InstanceId>,
    /// Final counters.
    pub progress: BuildProgress,
    /// Warnings in the order they were met.
    pub warnings: Vec<BuildWarning>,
    /// Cutoff that stopped expansion, if any.
    pub cutoff: Option<Cutoff>,
    /// Whether the session was cancelled before completing.
    pub cancelled: bool,
    /// Wall-clock time since start.
    pub elapsed: Duration,
    /// Resolver diagnostics for the session.
    pub resolution: ResolveSummary,
    /// Camera derived from the built scene.
    pub camera: CameraSetup,
}
