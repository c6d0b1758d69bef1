// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis descriptors and their mapping into scene coordinates.

/// How values along an axis are spaced on screen.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AxisScale {
    /// Equal steps for equal differences.
    #[default]
    Linear,
    /// Equal steps for equal ratios.
    Log,
}

/// One histogram axis: `nbins` equal bins between `min` and `max`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Axis {
    /// Number of in-range bins.
    pub nbins: usize,
    /// Lower edge of the first bin.
    pub min: f64,
    /// Upper edge of the last bin.
    pub max: f64,
    /// Display spacing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub scale: AxisScale,
}

/// Fraction of the upper bound used as the lower bound of a log axis whose
/// minimum is not positive.
pub const LOG_MIN_FRACTION: f64 = 1e-6;

impl Axis {
    /// A linear axis.
    pub const fn linear(nbins: usize, min: f64, max: f64) -> Self {
        Self {
            nbins,
            min,
            max,
            scale: AxisScale::Linear,
        }
    }

    /// The same axis with logarithmic spacing.
    #[must_use]
    pub const fn log(self) -> Self {
        Self {
            scale: AxisScale::Log,
            ..self
        }
    }

    /// Width of one bin.
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.nbins as f64
    }

    /// Centre of in-range bin `i` (zero based).
    pub fn bin_center(&self, i: usize) -> f64 {
        self.min + (i as f64 + 0.5) * self.bin_width()
    }

    /// Map this axis onto `[lo, hi]` in scene coordinates.
    ///
    /// For a logarithmic axis a non-positive maximum is replaced by `1`, and a
    /// non-positive minimum by [`LOG_MIN_FRACTION`] times the maximum.
    pub fn mapping(&self, lo: f64, hi: f64) -> AxisMapping {
        match self.scale {
            AxisScale::Linear => AxisMapping {
                domain: (self.min, self.max),
                range: (lo, hi),
                log: false,
            },
            AxisScale::Log => {
                let max = if self.max <= 0.0 { 1.0 } else { self.max };
                let min = if self.min <= 0.0 {
                    LOG_MIN_FRACTION * max
                } else {
                    self.min
                };
                AxisMapping {
                    domain: (min, max),
                    range: (lo, hi),
                    log: true,
                }
            }
        }
    }
}

/// A monotone map from an axis domain onto a scene range.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisMapping {
    /// Domain edges after any log fallback.
    pub domain: (f64, f64),
    /// Target range.
    pub range: (f64, f64),
    /// Whether the domain is spaced logarithmically.
    pub log: bool,
}

impl AxisMapping {
    /// Map `v` into the target range.
    ///
    /// On a log mapping, non-positive values are clamped to the domain minimum.
    /// A zero-width domain maps everything to the middle of the range.
    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let t = if self.log {
            let v = if v <= 0.0 { d0 } else { v };
            let span = d1.log10() - d0.log10();
            if span == 0.0 {
                0.5
            } else {
                (v.log10() - d0.log10()) / span
            }
        } else if d1 == d0 {
            0.5
        } else {
            (v - d0) / (d1 - d0)
        };
        r0 + t * (r1 - r0)
    }
}
