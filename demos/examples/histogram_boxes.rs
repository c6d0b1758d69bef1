// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Histogram boxes.
//!
//! Fill a 3D histogram with a Gaussian blob, project its bins into boxes,
//! attach them to a scene, and thin a point cloud for marker drawing.
//!
//! Run:
//! - `cargo run -p understory_demos --example histogram_boxes`

use glam::DVec3;
use tracing_subscriber::EnvFilter;
use understory_histogram::{
    Axis, BinShape, Histogram, ProjectOptions, Projection, populate, project_bins, project_points,
};
use understory_mesh_tree::{Aabb, SceneTree};
use understory_scene_builder::{MeshError, MeshFactory, MeshMaterial};

/// Meshes are reduced to their bounds.
struct Solids;

impl MeshFactory<BinShape> for Solids {
    type Mesh = Aabb;

    fn create_mesh(&mut self, shape: &BinShape, _: &MeshMaterial) -> Result<Aabb, MeshError> {
        let half = match *shape {
            BinShape::Box { half_extents } => half_extents,
            BinShape::Sphere { radius } => DVec3::splat(radius),
        };
        Ok(Aabb::from_center_half_extents(DVec3::ZERO, half))
    }

    fn local_bounds(&self, mesh: &Aabb) -> Option<Aabb> {
        Some(*mesh)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("debug".parse()?))
        .init();

    let axis = Axis::linear(12, -3.0, 3.0);
    let mut contents = Vec::with_capacity(12 * 12 * 12);
    for k in 0..12 {
        for j in 0..12 {
            for i in 0..12 {
                let p = DVec3::new(axis.bin_center(i), axis.bin_center(j), axis.bin_center(k));
                contents.push((100.0 * (-0.5 * p.length_squared()).exp()).floor());
            }
        }
    }
    let hist = Histogram::new(vec![axis; 3], contents)?;
    let stats = hist.stats();
    println!(
        "entries {} mean {:?} rms {:?}",
        stats.entries, stats.mean, stats.rms
    );

    let options = ProjectOptions::default();
    let bins = project_bins(&hist, &options)?;
    let mut tree = SceneTree::new();
    let populated = populate(&mut tree, None, &bins, &mut Solids, 2, options.size);
    println!(
        "{} of {} bins drawn; camera at {:?}, far plane {}",
        populated.created,
        hist.bins().count(),
        populated.camera.position,
        populated.camera.far
    );

    // Golden-angle spiral standing in for recorded hits.
    let points: Vec<DVec3> = (0..5000)
        .map(|n| {
            let t = f64::from(n) / 5000.0;
            let angle = f64::from(n) * 2.399_963;
            DVec3::new(3.0 * t * angle.cos(), 3.0 * t * angle.sin(), 6.0 * t - 3.0)
        })
        .collect();
    let markers = project_points(&points, &Projection::new(&hist, options.size));
    println!("{} of {} markers kept", markers.len(), points.len());
    Ok(())
}
