// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for placement graph operations.

use alloc::string::String;

use thiserror::Error;

use crate::types::{NodeId, VolumeId};

/// Errors raised while editing or interpreting a placement graph.
///
/// None of these are fatal to a scene build: the builder skips the offending
/// node and records a warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The volume identifier was not issued by this graph.
    #[error("unknown volume {0:?}")]
    UnknownVolume(VolumeId),
    /// The node identifier was not issued by this graph.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    /// The node is a division cell whose pattern cannot be placed.
    #[error("unsupported division pattern `{pattern}` on node `{node}`")]
    UnsupportedPattern {
        /// Name of the node being placed.
        node: String,
        /// Type name of the pattern.
        pattern: String,
    },
}
