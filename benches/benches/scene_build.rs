// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::DVec3;
use understory_mesh_tree::{Aabb, SceneTree};
use understory_placement::{
    Node, NodeId, PlacementGraph, ResolveOptions, Transform, Volume, count_nodes,
    resolve_shared_subtrees,
};
use understory_scene_builder::{
    BuildOptions, BuildState, MeshError, MeshFactory, MeshMaterial, SceneBuilder,
};

struct Boxes;

impl MeshFactory<DVec3> for Boxes {
    type Mesh = DVec3;

    fn create_mesh(&mut self, half: &DVec3, _: &MeshMaterial) -> Result<DVec3, MeshError> {
        Ok(*half)
    }

    fn local_bounds(&self, half: &DVec3) -> Option<Aabb> {
        Some(Aabb::from_center_half_extents(DVec3::ZERO, *half))
    }
}

/// `depth` levels of volumes, each placing the next one `fanout` times.
fn layered(depth: usize, fanout: usize) -> (PlacementGraph<DVec3>, NodeId) {
    let mut g = PlacementGraph::new();
    let volumes: Vec<_> = (0..=depth)
        .map(|d| g.add_volume(Volume::new(format!("level_{d}"), Some(DVec3::splat(1.0 + d as f64)))))
        .collect();
    let root = g.add_root(volumes[0]).expect("root volume exists");
    for pair in volumes.windows(2) {
        for i in 0..fanout {
            let at = DVec3::new(i as f64 * 3.0, 0.0, 0.0);
            g.place(
                pair[0],
                Node::new(format!("n{i}"), pair[1]).with_transform(Transform::from_translation(at)),
            )
            .expect("parent volume exists");
        }
    }
    (g, root)
}

fn expanded(depth: usize, fanout: usize) -> u64 {
    (0..=depth).map(|d| (fanout as u64).pow(d as u32)).sum()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for &(depth, fanout) in &[(4usize, 4usize), (6, 4), (3, 30)] {
        let (g, root) = layered(depth, fanout);
        group.throughput(Throughput::Elements(g.node_count() as u64));
        group.bench_function(format!("shared_subtrees_d{depth}_f{fanout}"), |b| {
            b.iter(|| {
                let r = resolve_shared_subtrees(&g, root, ResolveOptions::default())
                    .expect("root exists");
                black_box(r.iterations_used());
            });
        });
        group.bench_function(format!("count_nodes_d{depth}_f{fanout}"), |b| {
            b.iter(|| black_box(count_nodes(&g, root).expect("root exists").total));
        });
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &(depth, fanout) in &[(4usize, 4usize), (5, 5)] {
        let (g, root) = layered(depth, fanout);
        group.throughput(Throughput::Elements(expanded(depth, fanout)));
        group.bench_function(format!("single_pass_d{depth}_f{fanout}"), |b| {
            b.iter_batched(
                SceneTree::new,
                |mut tree| {
                    let report = SceneBuilder::start(
                        &g,
                        root,
                        &mut tree,
                        &mut Boxes,
                        BuildOptions::unlimited(),
                    )
                    .expect("root exists")
                    .run_to_completion();
                    black_box(report.progress.copied);
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("zero_slices_d{depth}_f{fanout}"), |b| {
            b.iter_batched(
                SceneTree::new,
                |mut tree| {
                    let mut factory = Boxes;
                    let mut builder = SceneBuilder::start(
                        &g,
                        root,
                        &mut tree,
                        &mut factory,
                        BuildOptions::unlimited(),
                    )
                    .expect("root exists");
                    let mut slices = 0_usize;
                    while builder.run_for(Duration::ZERO) != BuildState::Complete {
                        slices += 1;
                    }
                    black_box(slices);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_build);
criterion_main!(benches);
