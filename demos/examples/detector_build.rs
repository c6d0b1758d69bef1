// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Detector build.
//!
//! Describe a small barrel calorimeter, build it in short time slices the way
//! a render loop would, and print the report.
//!
//! The first argument is a textual draw option (`all`, `limit`, `maxlvl3`,
//! plus helper letters such as `b`); the optional second argument is a JSON
//! file with `BuildOptions` fields. Missing fields keep their defaults.
//!
//! Run:
//! - `cargo run -p understory_demos --example detector_build -- limit`
//! - `RUST_LOG=debug cargo run -p understory_demos --example detector_build -- maxlvl3 build.json`

use std::sync::Arc;
use std::time::Duration;

use glam::DVec3;
use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_mesh_tree::{Aabb, SceneTree};
use understory_placement::{
    Division, Material, Node, NodeId, Pattern, PlacementGraph, Transform, VisFlags, Volume,
};
use understory_scene_builder::{
    BuildOptions, BuildState, DrawOptions, MeshError, MeshFactory, MeshMaterial, SceneBuilder,
};

#[derive(Clone, Debug)]
enum Solid {
    Box { half: DVec3 },
    Tube { rmin: f64, rmax: f64, dz: f64 },
    Polycone,
}

#[derive(Debug)]
struct Mesh {
    triangles: usize,
    bounds: Aabb,
}

/// Counts triangles instead of producing GPU buffers.
#[derive(Default)]
struct Tessellator {
    triangles: usize,
}

impl MeshFactory<Solid> for Tessellator {
    type Mesh = Arc<Mesh>;

    fn create_mesh(&mut self, solid: &Solid, _: &MeshMaterial) -> Result<Self::Mesh, MeshError> {
        let (triangles, half) = match *solid {
            Solid::Box { half } => (12, half),
            Solid::Tube { rmin, rmax, dz } => {
                if rmax <= rmin {
                    return Err(MeshError::Degenerate(format!(
                        "tube with rmax {rmax} <= rmin {rmin}"
                    )));
                }
                (96, DVec3::new(rmax, rmax, dz))
            }
            Solid::Polycone => return Err(MeshError::UnsupportedShape("polycone".into())),
        };
        self.triangles += triangles;
        Ok(Arc::new(Mesh {
            triangles,
            bounds: Aabb::from_center_half_extents(DVec3::ZERO, half),
        }))
    }

    fn local_bounds(&self, mesh: &Self::Mesh) -> Option<Aabb> {
        Some(mesh.bounds)
    }
}

/// hall ─┬─ barrel (assembly) ─ 16 × sector ─ 8 × module ─ 28 × crystal
///       └─ cryostat (polycone, not meshable)
fn calorimeter() -> anyhow::Result<(PlacementGraph<Solid>, NodeId)> {
    let mut g = PlacementGraph::new();
    let hall = g.add_volume(
        Volume::new(
            "hall",
            Some(Solid::Box {
                half: DVec3::splat(400.0),
            }),
        )
        .with_vis(VisFlags::DAUGHTERS),
    );
    let barrel = g.add_volume(Volume::new("barrel", None));
    let sector = g.add_volume(
        Volume::new(
            "sector",
            Some(Solid::Tube {
                rmin: 100.0,
                rmax: 180.0,
                dz: 150.0,
            }),
        )
        .with_material(Material {
            fill_style: 3070,
            fill_color: 3,
        })
        .with_line_color(3),
    );
    let module = g.add_volume(
        Volume::new(
            "module",
            Some(Solid::Box {
                half: DVec3::new(10.0, 10.0, 140.0),
            }),
        )
        .with_line_color(4),
    );
    let crystal = g.add_volume(
        Volume::new(
            "crystal",
            Some(Solid::Box {
                half: DVec3::new(2.0, 2.0, 4.5),
            }),
        )
        .with_line_color(5),
    );
    let cryostat = g.add_volume(Volume::new("cryostat", Some(Solid::Polycone)));

    let root = g.add_root(hall)?;
    g.place(hall, Node::new("barrel", barrel))?;
    g.place(hall, Node::new("cryostat", cryostat))?;

    let phi = Arc::new(Pattern::CylPhi {
        start: 0.0,
        step: 360.0 / 16.0,
        sin_cos: None,
    });
    for i in 0..16 {
        g.place(
            barrel,
            Node::new(format!("sector_{i}"), sector).with_division(Division {
                pattern: Arc::clone(&phi),
                index: i,
            }),
        )?;
    }
    for m in 0..8 {
        let y = -70.0 + 20.0 * f64::from(m);
        g.place(
            sector,
            Node::new(format!("module_{m}"), module)
                .with_transform(Transform::from_translation(DVec3::new(140.0, y, 0.0))),
        )?;
    }
    for c in 0..28 {
        let z = -135.0 + 10.0 * f64::from(c);
        g.place(
            module,
            Node::new(format!("crystal_{c}"), crystal)
                .with_transform(Transform::from_translation(DVec3::new(0.0, 0.0, z))),
        )?;
    }
    Ok((g, root))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let mut args = std::env::args().skip(1);
    let draw: DrawOptions = args.next().as_deref().unwrap_or("limit").parse()?;
    let mut options: BuildOptions = match args.next() {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => BuildOptions::default(),
    };

    let (graph, root) = calorimeter()?;
    options.apply(&draw, &graph, root)?;
    info!(
        max_depth = options.max_depth,
        node_budget = ?options.node_budget,
        helpers = ?options.debug,
        "build options"
    );

    let mut tree = SceneTree::new();
    let mut factory = Tessellator::default();
    let mut builder = SceneBuilder::start(&graph, root, &mut tree, &mut factory, options)?;

    // A host would render and handle input between slices.
    let mut slices = 1;
    while builder.run_for(Duration::from_millis(2)) == BuildState::Suspended {
        slices += 1;
        println!("creating geometry {}", builder.progress().visits);
    }
    let report = builder.finish();

    println!("slices:     {slices}");
    println!("progress:   {:?}", report.progress);
    println!("cutoff:     {:?}", report.cutoff);
    println!("resolution: {:?}", report.resolution);
    for warning in &report.warnings {
        println!("warning:    {warning}");
    }
    println!(
        "camera:     scale {} near {} far {} at {:?}",
        report.camera.scale, report.camera.near, report.camera.far, report.camera.position
    );

    let drawn_triangles: usize = report
        .root
        .map(|r| tree.subtree(r))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| tree.get(id)?.mesh.as_ref().map(|m| m.triangles))
        .sum();
    println!(
        "instances:  {} ({} triangles tessellated, {} in the scene)",
        tree.len(),
        factory.triangles,
        drawn_triangles
    );
    Ok(())
}
