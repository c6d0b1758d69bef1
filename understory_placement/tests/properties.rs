// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests over randomly generated acyclic placement graphs.

#![allow(missing_docs, reason = "Integration tests do not need docs.")]

use proptest::prelude::*;

use understory_placement::{
    Node, NodeId, PlacementGraph, ResolveOptions, Volume, VolumeId, count_nodes,
    resolve_shared_subtrees,
};

/// Build a DAG whose edges only point from lower to higher volume indices.
fn build(volumes: usize, edges: &[(usize, usize)]) -> (PlacementGraph<()>, NodeId, Vec<VolumeId>) {
    let mut graph = PlacementGraph::new();
    let ids: Vec<_> = (0..volumes)
        .map(|i| graph.add_volume(Volume::new(format!("v{i}"), None)))
        .collect();
    let root = graph.add_root(ids[0]).unwrap();
    for (k, &(a, b)) in edges.iter().enumerate() {
        let (parent, child) = if a < b { (a, b) } else { (b, a) };
        if parent == child {
            continue;
        }
        graph
            .place(ids[parent], Node::new(format!("n{k}"), ids[child]))
            .unwrap();
    }
    (graph, root, ids)
}

fn dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2_usize..7).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..12)))
}

proptest! {
    #[test]
    fn total_is_one_plus_children((n, edges) in dag()) {
        let (graph, root, _) = build(n, &edges);
        let whole = count_nodes(&graph, root).unwrap();
        let children: u64 = graph
            .children_of(root)
            .iter()
            .map(|&c| count_nodes(&graph, c).unwrap().total)
            .sum();
        prop_assert_eq!(whole.total, 1 + children);
        prop_assert_eq!(whole.per_level.iter().sum::<u64>(), whole.total);
        prop_assert!(!whole.truncated);
    }

    #[test]
    fn descendants_match_count((n, edges) in dag()) {
        let (graph, root, ids) = build(n, &edges);
        let total = count_nodes(&graph, root).unwrap().total;
        let r = resolve_shared_subtrees(&graph, root, ResolveOptions::default()).unwrap();
        prop_assert_eq!(r.descendant_count(ids[0]) + 1, total);
    }

    #[test]
    fn resolver_is_monotone_and_converges((n, edges) in dag()) {
        let (graph, root, _) = build(n, &edges);
        let r = resolve_shared_subtrees(&graph, root, ResolveOptions::default()).unwrap();
        prop_assert!(r.converged(), "acyclic input settles before the cap");
        prop_assert!(r.growth().windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(r.growth().len(), r.iterations_used() as usize);
    }

    #[test]
    fn single_reference_is_never_independent((n, edges) in dag()) {
        let (graph, root, ids) = build(n, &edges);
        let r = resolve_shared_subtrees(&graph, root, ResolveOptions::default()).unwrap();
        for &v in &ids {
            if r.reference_count(v) <= 1 {
                prop_assert!(!r.needs_independent_processing(v), "{:?} placed once", v);
            }
        }
        for &v in r.independent_volumes() {
            prop_assert!(r.reference_count(v) > 1);
        }
    }
}
