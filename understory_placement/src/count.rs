// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Size diagnostics over the fully expanded placement tree.

use alloc::vec;
use alloc::vec::Vec;

use tracing::warn;

use crate::error::GraphError;
use crate::graph::PlacementGraph;
use crate::types::NodeId;

/// Node occurrence counts below a root, as if every shared volume were expanded in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeCount {
    /// Total occurrences, the root included (saturating).
    pub total: u64,
    /// Occurrences per depth; `per_level[0]` is the root.
    pub per_level: Vec<u64>,
    /// Distinct reachable volumes.
    pub unique_volumes: usize,
    /// Distinct reachable nodes.
    pub unique_nodes: usize,
    /// Counting stopped early because the graph has a cycle below the root.
    pub truncated: bool,
}

impl NodeCount {
    /// Deepest `max_depth` whose levels below the root sum to at most `ceiling`.
    ///
    /// Returns `None` when the whole tree fits. A result of `Some(0)` means
    /// only the root fits.
    pub fn depth_for_ceiling(&self, ceiling: u64) -> Option<u32> {
        let mut sum = 0_u64;
        for (level, &count) in self.per_level.iter().enumerate().skip(1) {
            sum = sum.saturating_add(count);
            if sum > ceiling {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "Depth is bounded by the node count, which fits in 32 bits."
                )]
                return Some((level - 1) as u32);
            }
        }
        None
    }
}

/// Count node occurrences level by level below `root`.
///
/// Works on occurrence multiplicities rather than by expanding paths, so the
/// cost is proportional to depth times reachable edges even when the expanded
/// tree is huge.
pub fn count_nodes<S>(graph: &PlacementGraph<S>, root: NodeId) -> Result<NodeCount, GraphError> {
    let Some(root_volume) = graph.volume_of(root) else {
        return Err(GraphError::UnknownNode(root));
    };

    let mut node_seen = vec![false; graph.node_count()];
    let mut volume_seen = vec![false; graph.volume_count()];
    node_seen[root.idx()] = true;
    volume_seen[root_volume.idx()] = true;

    let mut out = NodeCount {
        total: 1,
        per_level: vec![1],
        unique_volumes: 1,
        unique_nodes: 1,
        truncated: false,
    };

    // An acyclic graph has no path longer than its node count.
    let max_levels = graph.node_count() + 1;
    let mut multiplicity = vec![0_u64; graph.node_count()];
    let mut frontier: Vec<(NodeId, u64)> = vec![(root, 1)];
    let mut next_ids: Vec<NodeId> = Vec::new();

    while !frontier.is_empty() {
        if out.per_level.len() >= max_levels {
            warn!(?root, "placement graph has a cycle below the root; count truncated");
            out.truncated = true;
            break;
        }
        for &(node, mult) in &frontier {
            for &child in graph.children_of(node) {
                let slot = &mut multiplicity[child.idx()];
                if *slot == 0 {
                    next_ids.push(child);
                }
                *slot = slot.saturating_add(mult);
                if !core::mem::replace(&mut node_seen[child.idx()], true) {
                    out.unique_nodes += 1;
                    if let Some(v) = graph.volume_of(child) {
                        if !core::mem::replace(&mut volume_seen[v.idx()], true) {
                            out.unique_volumes += 1;
                        }
                    }
                }
            }
        }
        frontier.clear();
        let mut level = 0_u64;
        for id in next_ids.drain(..) {
            let mult = core::mem::take(&mut multiplicity[id.idx()]);
            level = level.saturating_add(mult);
            frontier.push((id, mult));
        }
        if level > 0 {
            out.per_level.push(level);
            out.total = out.total.saturating_add(level);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Node, Volume};

    #[test]
    fn counts_expanded_occurrences() {
        // world ─┬─ a1 → A ─┬─ c1 → C
        //        │          └─ c2 → C
        //        └─ a2 → A
        let mut g: PlacementGraph<()> = PlacementGraph::new();
        let world = g.add_volume(Volume::new("world", None));
        let a = g.add_volume(Volume::new("A", None));
        let c = g.add_volume(Volume::new("C", None));
        let root = g.add_root(world).unwrap();
        let a1 = g.place(world, Node::new("a1", a)).unwrap();
        g.place(world, Node::new("a2", a)).unwrap();
        g.place(a, Node::new("c1", c)).unwrap();
        g.place(a, Node::new("c2", c)).unwrap();

        let count = count_nodes(&g, root).unwrap();
        assert_eq!(count.per_level, vec![1, 2, 4]);
        assert_eq!(count.total, 7);
        assert_eq!(count.unique_volumes, 3);
        assert_eq!(count.unique_nodes, 5);
        assert!(!count.truncated);

        let sub = count_nodes(&g, a1).unwrap();
        assert_eq!(sub.total, 3);
    }

    #[test]
    fn ceiling_selects_depth() {
        let count = NodeCount {
            total: 1 + 10 + 100 + 1000,
            per_level: vec![1, 10, 100, 1000],
            ..Default::default()
        };
        assert_eq!(count.depth_for_ceiling(5), Some(0));
        assert_eq!(count.depth_for_ceiling(110), Some(2));
        assert_eq!(count.depth_for_ceiling(10_000), None);
    }

    #[test]
    fn cycle_is_truncated() {
        let mut g: PlacementGraph<()> = PlacementGraph::new();
        let a = g.add_volume(Volume::new("A", None));
        let root = g.add_root(a).unwrap();
        g.place(a, Node::new("self", a)).unwrap();
        let count = count_nodes(&g, root).unwrap();
        assert!(count.truncated);
        assert_eq!(count.per_level.len(), g.node_count() + 1);
    }
}
