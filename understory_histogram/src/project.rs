// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bin-to-scene projection and point-cloud thinning.

use glam::DVec3;
use tracing::debug;

use crate::axis::{Axis, AxisMapping, AxisScale};
use crate::error::HistError;
use crate::histogram::Histogram;

/// Half-width of the cube histograms are drawn in.
pub const DEFAULT_SIZE: f64 = 100.0;

/// Number of markers a point cloud is thinned to, roughly.
pub const POINT_BUDGET: usize = 300;

/// Solid used for 3D bins.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BinStyle {
    /// Boxes whose edge lengths scale with content.
    #[default]
    Box,
    /// Spheres whose radius scales with content.
    Sphere,
}

/// Projection settings.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize), serde(default))]
pub struct ProjectOptions {
    /// Half-width of the target cube; z spans `[0, 2 * size]`.
    pub size: f64,
    /// Bins at or below this content are skipped. Defaults to the global minimum.
    pub floor: Option<f64>,
    /// Solid used for 3D bins.
    pub style: BinStyle,
    /// Draw every 3D bin at maximum size; content is left to colour.
    pub color_only: bool,
    /// Spacing of column heights for 1D and 2D histograms.
    pub content_scale: AxisScale,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            floor: None,
            style: BinStyle::Box,
            color_only: false,
            content_scale: AxisScale::Linear,
        }
    }
}

/// Solid of one projected bin, centred on its position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BinShape {
    /// An axis-aligned box.
    Box {
        /// Half edge lengths.
        half_extents: DVec3,
    },
    /// A sphere.
    Sphere {
        /// Radius.
        radius: f64,
    },
}

/// A bin placed in scene coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BinPlacement {
    /// Zero-based `(x, y, z)` bin indices.
    pub index: [usize; 3],
    /// Centre of the solid.
    pub position: DVec3,
    /// The solid.
    pub shape: BinShape,
    /// Bin content.
    pub content: f64,
}

/// Axis mappings from histogram coordinates into the drawing cube.
///
/// x and y land in `[-size, size]`, z in `[0, 2 * size]`. Missing axes map a
/// unit range.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projection {
    /// Half-width of the cube.
    pub size: f64,
    /// x mapping.
    pub x: AxisMapping,
    /// y mapping.
    pub y: AxisMapping,
    /// z mapping.
    pub z: AxisMapping,
}

impl Projection {
    /// Mappings for the axes of `hist`.
    pub fn new(hist: &Histogram, size: f64) -> Self {
        Self {
            size,
            x: hist.axis_or_unit(0).mapping(-size, size),
            y: hist.axis_or_unit(1).mapping(-size, size),
            z: hist.axis_or_unit(2).mapping(0.0, 2.0 * size),
        }
    }

    /// Map a point in histogram coordinates.
    pub fn map(&self, p: DVec3) -> DVec3 {
        DVec3::new(self.x.map(p.x), self.y.map(p.y), self.z.map(p.z))
    }
}

/// Place every 3D bin above the content floor as a box or sphere.
///
/// Sizes are proportional to content relative to the maximum: a bin at the
/// maximum spans one bin width along each axis.
pub fn project_bins(
    hist: &Histogram,
    options: &ProjectOptions,
) -> Result<Vec<BinPlacement>, HistError> {
    if hist.dim() != 3 {
        return Err(HistError::WrongDimension {
            expected: 3,
            found: hist.dim(),
        });
    }
    let range = hist.scan();
    if !range.has_content() {
        return Ok(Vec::new());
    }
    let floor = options.floor.unwrap_or(range.min);
    let projection = Projection::new(hist, options.size);
    let per_content = DVec3::from_array(
        [0, 1, 2].map(|i| 2.0 * options.size / hist.axis_or_unit(i).nbins as f64 / range.max),
    );

    let out: Vec<_> = hist
        .bins()
        .filter(|b| b.content > floor)
        .map(|b| {
            let weight = if options.color_only { range.max } else { b.content };
            let shape = match options.style {
                BinStyle::Box => BinShape::Box {
                    half_extents: 0.5 * weight * per_content,
                },
                BinStyle::Sphere => BinShape::Sphere {
                    radius: 0.5 * weight * per_content.x,
                },
            };
            BinPlacement {
                index: b.index,
                position: projection.map(b.center),
                shape,
                content: b.content,
            }
        })
        .collect();
    debug!(bins = out.len(), floor, max = range.max, "projected 3D bins");
    Ok(out)
}

/// Place every 1D or 2D bin above the content floor as a column standing on `z = 0`.
///
/// Column heights map content from the floor to 5% above the maximum onto
/// `[0, 2 * size]`.
pub fn project_columns(
    hist: &Histogram,
    options: &ProjectOptions,
) -> Result<Vec<BinPlacement>, HistError> {
    if hist.dim() > 2 {
        return Err(HistError::WrongDimension {
            expected: 2,
            found: hist.dim(),
        });
    }
    let range = hist.scan();
    if !range.has_content() {
        return Ok(Vec::new());
    }
    let floor = options.floor.unwrap_or(range.min);
    let projection = Projection::new(hist, options.size);
    let heights = Axis {
        nbins: 1,
        min: floor,
        max: range.max * 1.05,
        scale: options.content_scale,
    }
    .mapping(0.0, 2.0 * options.size);
    let footprint = DVec3::new(
        options.size / hist.axis_or_unit(0).nbins as f64,
        options.size / hist.axis_or_unit(1).nbins as f64,
        0.0,
    );

    let out: Vec<_> = hist
        .bins()
        .filter(|b| b.content > floor)
        .map(|b| {
            let height = heights.map(b.content);
            BinPlacement {
                index: b.index,
                position: DVec3::new(
                    projection.x.map(b.center.x),
                    projection.y.map(b.center.y),
                    0.5 * height,
                ),
                shape: BinShape::Box {
                    half_extents: footprint + DVec3::Z * (0.5 * height),
                },
                content: b.content,
            }
        })
        .collect();
    debug!(bins = out.len(), floor, max = range.max, "projected columns");
    Ok(out)
}

/// Stride that keeps about `budget` of `count` items.
///
/// `1` while `count` fits; otherwise `count / budget`, but never below `2`.
pub fn thinning_step(count: usize, budget: usize) -> usize {
    if count <= budget {
        1
    } else {
        (count / budget.max(1)).max(2)
    }
}

/// Every [`thinning_step`]-th point, starting with the first.
pub fn thin_points(points: &[DVec3], budget: usize) -> impl Iterator<Item = DVec3> + '_ {
    points
        .iter()
        .copied()
        .step_by(thinning_step(points.len(), budget))
}

/// Thin a point cloud to about [`POINT_BUDGET`] markers and map it into the drawing cube.
pub fn project_points(points: &[DVec3], projection: &Projection) -> Vec<DVec3> {
    let out: Vec<_> = thin_points(points, POINT_BUDGET)
        .map(|p| projection.map(p))
        .collect();
    debug!(points = points.len(), kept = out.len(), "projected point cloud");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(contents: Vec<f64>) -> Histogram {
        Histogram::new(vec![Axis::linear(2, 0.0, 2.0); 3], contents).unwrap()
    }

    #[test]
    fn thinning_keeps_about_the_budget() {
        assert_eq!(thinning_step(300, 300), 1);
        assert_eq!(thinning_step(301, 300), 2, "never a stride of one");
        assert_eq!(thinning_step(1000, 300), 3);

        let points = vec![DVec3::ZERO; 1000];
        assert_eq!(thin_points(&points, 300).count(), 334);
        assert_eq!(thin_points(&points[..301], 300).count(), 151);
        assert_eq!(thin_points(&points[..5], 300).count(), 5);
    }

    #[test]
    fn bins_above_floor_scale_with_content() {
        let mut contents = vec![0.0; 8];
        contents[0] = 4.0;
        contents[7] = 2.0;
        let bins = project_bins(&cube(contents), &ProjectOptions::default()).unwrap();
        assert_eq!(bins.len(), 2, "empty bins sit at the floor");

        // Full bin: one bin width (100) per axis; half bin: half that.
        assert_eq!(
            bins[0].shape,
            BinShape::Box {
                half_extents: DVec3::splat(50.0)
            }
        );
        assert_eq!(
            bins[1].shape,
            BinShape::Box {
                half_extents: DVec3::splat(25.0)
            }
        );
        assert_eq!(bins[0].position, DVec3::new(-50.0, -50.0, 50.0));
        assert_eq!(bins[1].index, [1, 1, 1]);
        assert_eq!(bins[1].position, DVec3::new(50.0, 50.0, 150.0));
    }

    #[test]
    fn spheres_and_color_only() {
        let mut contents = vec![0.0; 8];
        contents[0] = 4.0;
        contents[1] = 1.0;
        let options = ProjectOptions {
            style: BinStyle::Sphere,
            color_only: true,
            ..ProjectOptions::default()
        };
        let bins = project_bins(&cube(contents), &options).unwrap();
        for b in &bins {
            assert_eq!(b.shape, BinShape::Sphere { radius: 50.0 });
        }
    }

    #[test]
    fn empty_or_wrong_dimension() {
        assert!(project_bins(&cube(vec![0.0; 8]), &ProjectOptions::default())
            .unwrap()
            .is_empty());
        let flat = Histogram::new(vec![Axis::linear(4, 0.0, 1.0)], vec![1.0; 4]).unwrap();
        assert_eq!(
            project_bins(&flat, &ProjectOptions::default()),
            Err(HistError::WrongDimension {
                expected: 3,
                found: 1
            })
        );
    }

    #[test]
    fn columns_stand_on_the_floor() {
        let h = Histogram::new(
            vec![Axis::linear(2, 0.0, 1.0), Axis::linear(2, 0.0, 1.0)],
            vec![0.0, 10.0, 5.0, 0.0],
        )
        .unwrap();
        let cols = project_columns(&h, &ProjectOptions::default()).unwrap();
        assert_eq!(cols.len(), 2);
        for c in &cols {
            let BinShape::Box { half_extents } = c.shape else {
                panic!("columns are boxes");
            };
            assert_eq!(half_extents.x, 50.0);
            assert_eq!(half_extents.y, 50.0);
            assert!((c.position.z - half_extents.z).abs() < 1e-9, "base at z = 0");
        }
        let tallest = cols.iter().find(|c| c.content == 10.0).unwrap();
        assert!((tallest.position.z * 2.0 - 200.0 / 1.05).abs() < 1e-9);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn options_from_partial_config() {
        let opts: ProjectOptions =
            serde_json::from_str(r#"{ "style": "Sphere", "floor": 2.5 }"#).unwrap();
        assert_eq!(opts.style, BinStyle::Sphere);
        assert_eq!(opts.floor, Some(2.5));
        assert_eq!(opts.size, DEFAULT_SIZE);
        assert_eq!(opts.content_scale, AxisScale::Linear);

        let axes: Vec<Axis> = serde_json::from_str(
            r#"[{ "nbins": 10, "min": 1.0, "max": 100.0 },
                { "nbins": 4, "min": 1.0, "max": 1000.0, "scale": "Log" }]"#,
        )
        .unwrap();
        assert_eq!(axes[0], Axis::linear(10, 1.0, 100.0));
        assert_eq!(axes[1], Axis::linear(4, 1.0, 1000.0).log());
    }
}
