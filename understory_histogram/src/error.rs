// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors raised when describing or projecting a histogram.
///
/// Degenerate logarithmic ranges are not errors; they fall back to a small
/// positive minimum (see [`Axis::mapping`](crate::Axis::mapping)).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistError {
    /// Histograms have one, two or three axes.
    #[error("histogram must have 1 to 3 axes, got {0}")]
    Dimension(usize),
    /// An axis has no bins.
    #[error("axis {axis} has no bins")]
    EmptyAxis {
        /// Axis index, `0` for x.
        axis: usize,
    },
    /// An axis range is not finite or is reversed.
    #[error("axis {axis} has invalid range [{min}, {max}]")]
    InvalidRange {
        /// Axis index, `0` for x.
        axis: usize,
        /// Lower edge.
        min: f64,
        /// Upper edge.
        max: f64,
    },
    /// The content grid does not match the axes.
    #[error("expected {expected} bin contents, got {found}")]
    ContentLength {
        /// Product of the axis bin counts.
        expected: usize,
        /// Length of the supplied contents.
        found: usize,
    },
    /// The projection needs a different number of axes.
    #[error("projection needs a {expected}-dimensional histogram, got {found}")]
    WrongDimension {
        /// Dimension the projection handles.
        expected: usize,
        /// Dimension of the histogram.
        found: usize,
    },
}
