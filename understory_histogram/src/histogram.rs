// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binned content grids, content scans, and summary statistics.

use glam::DVec3;

use crate::axis::Axis;
use crate::error::HistError;

/// A 1-, 2- or 3-dimensional grid of in-range bin contents.
///
/// Contents are stored with the x index varying fastest, then y, then z.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    axes: Vec<Axis>,
    contents: Vec<f64>,
    entries: Option<f64>,
}

impl Histogram {
    /// Validate `axes` against `contents`.
    pub fn new(axes: Vec<Axis>, contents: Vec<f64>) -> Result<Self, HistError> {
        if !(1..=3).contains(&axes.len()) {
            return Err(HistError::Dimension(axes.len()));
        }
        for (axis, a) in axes.iter().enumerate() {
            if a.nbins == 0 {
                return Err(HistError::EmptyAxis { axis });
            }
            if !a.min.is_finite() || !a.max.is_finite() || a.max < a.min {
                return Err(HistError::InvalidRange {
                    axis,
                    min: a.min,
                    max: a.max,
                });
            }
        }
        let expected = axes.iter().map(|a| a.nbins).product();
        if contents.len() != expected {
            return Err(HistError::ContentLength {
                expected,
                found: contents.len(),
            });
        }
        Ok(Self {
            axes,
            contents,
            entries: None,
        })
    }

    /// Record the number of fills, when it differs from the summed content.
    #[must_use]
    pub fn with_entries(mut self, entries: f64) -> Self {
        self.entries = Some(entries);
        self
    }

    /// Number of axes.
    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    /// The axes, x first.
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Axis `i`, or a single unit bin when the histogram has fewer axes.
    pub(crate) fn axis_or_unit(&self, i: usize) -> Axis {
        self.axes
            .get(i)
            .copied()
            .unwrap_or(Axis::linear(1, 0.0, 1.0))
    }

    /// Content of bin `(i, j, k)`; missing dimensions use index `0`.
    pub fn content(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        let nx = self.axis_or_unit(0).nbins;
        let ny = self.axis_or_unit(1).nbins;
        let nz = self.axis_or_unit(2).nbins;
        if i >= nx || j >= ny || k >= nz {
            return None;
        }
        self.contents.get(i + nx * (j + ny * k)).copied()
    }

    /// Every bin with its indices and centre, x varying fastest.
    pub fn bins(&self) -> impl Iterator<Item = Bin> + '_ {
        let [x, y, z] = [0, 1, 2].map(|i| self.axis_or_unit(i));
        self.contents.iter().enumerate().map(move |(n, &content)| {
            let i = n % x.nbins;
            let j = (n / x.nbins) % y.nbins;
            let k = n / (x.nbins * y.nbins);
            Bin {
                index: [i, j, k],
                center: DVec3::new(x.bin_center(i), y.bin_center(j), z.bin_center(k)),
                content,
            }
        })
    }

    /// Global minimum and maximum content.
    pub fn scan(&self) -> ContentRange {
        let mut it = self.contents.iter().copied();
        let first = it.next().unwrap_or(0.0);
        let (min, max) = it.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)));
        ContentRange { min, max }
    }

    /// Entries, integral, mean and RMS over the in-range bins.
    ///
    /// Entries are the recorded fill count when it exceeds one, otherwise the
    /// summed content.
    pub fn stats(&self) -> Stats {
        let mut sum = 0.0;
        let mut s1 = DVec3::ZERO;
        let mut s2 = DVec3::ZERO;
        for bin in self.bins() {
            sum += bin.content;
            s1 += bin.center * bin.content;
            s2 += bin.center * bin.center * bin.content;
        }
        let (mean, rms) = if sum > 0.0 {
            let mean = s1 / sum;
            let var = (s2 / sum - mean * mean).max(DVec3::ZERO);
            (mean, DVec3::new(var.x.sqrt(), var.y.sqrt(), var.z.sqrt()))
        } else {
            (DVec3::ZERO, DVec3::ZERO)
        };
        let dim = self.dim();
        let keep = |v: DVec3| {
            DVec3::new(
                v.x,
                if dim > 1 { v.y } else { 0.0 },
                if dim > 2 { v.z } else { 0.0 },
            )
        };
        Stats {
            entries: self.entries.filter(|e| *e > 1.0).unwrap_or(sum),
            integral: sum,
            mean: keep(mean),
            rms: keep(rms),
        }
    }
}

/// One bin of a [`Histogram`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bin {
    /// Zero-based `(x, y, z)` indices.
    pub index: [usize; 3],
    /// Centre in axis coordinates.
    pub center: DVec3,
    /// Bin content.
    pub content: f64,
}

/// Global content range of a histogram.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContentRange {
    /// Smallest bin content.
    pub min: f64,
    /// Largest bin content.
    pub max: f64,
}

impl ContentRange {
    /// Whether there is anything to draw.
    pub fn has_content(&self) -> bool {
        self.max > 0.0
    }
}

/// Summary statistics. Components for missing axes are zero.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Stats {
    /// Number of fills.
    pub entries: f64,
    /// Summed in-range content.
    pub integral: f64,
    /// Content-weighted mean per axis.
    pub mean: DVec3,
    /// Content-weighted standard deviation per axis.
    pub rms: DVec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(Histogram::new(vec![], vec![]), Err(HistError::Dimension(0)));
        assert_eq!(
            Histogram::new(vec![Axis::linear(2, 0.0, 1.0); 2], vec![0.0; 3]),
            Err(HistError::ContentLength {
                expected: 4,
                found: 3
            })
        );
        assert!(matches!(
            Histogram::new(vec![Axis::linear(2, 1.0, 0.0)], vec![0.0; 2]),
            Err(HistError::InvalidRange { axis: 0, .. })
        ));
    }

    #[test]
    fn bins_are_x_fastest() {
        let h = Histogram::new(
            vec![Axis::linear(2, 0.0, 2.0), Axis::linear(3, 0.0, 3.0)],
            (0..6).map(f64::from).collect(),
        )
        .unwrap();
        let b: Vec<_> = h.bins().collect();
        assert_eq!(b[1].index, [1, 0, 0]);
        assert_eq!(b[2].index, [0, 1, 0]);
        assert_eq!(b[5].center, DVec3::new(1.5, 2.5, 0.5));
        assert_eq!(h.content(1, 2, 0), Some(5.0));
        assert_eq!(h.content(2, 0, 0), None);
        assert_eq!(h.scan(), ContentRange { min: 0.0, max: 5.0 });
    }

    #[test]
    fn stats_over_in_range_bins() {
        // Two bins at centres 1 and 3 with equal weight.
        let h = Histogram::new(vec![Axis::linear(2, 0.0, 4.0)], vec![2.0, 2.0]).unwrap();
        let s = h.stats();
        assert_eq!(s.integral, 4.0);
        assert_eq!(s.entries, 4.0);
        assert_eq!(s.mean, DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(s.rms.x, 1.0);

        let s = h.with_entries(17.0).stats();
        assert_eq!(s.entries, 17.0);
        assert_eq!(s.integral, 4.0);
    }
}
