// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference counting and shared-subtree resolution.
//!
//! A volume placed by more than one node cannot be built once and attached in
//! several places: each occurrence needs its own instance. [`resolve_shared_subtrees`]
//! counts references over the part of the graph reachable from a root and marks
//! which volumes are affected, so that a builder knows which built subtrees are
//! worth keeping around for copying.
//!
//! ## Marking rules
//!
//! Rules are applied to every reachable volume, children before parents, and the
//! whole graph is re-scanned until a pass changes nothing:
//!
//! - a volume with a *processed* child volume is processed itself;
//! - a volume with more than one child whose volume is referenced more than once
//!   is processed, and those shared child volumes are registered for independent
//!   instancing;
//! - a volume referenced more than once is registered for independent instancing.
//!
//! Registered volumes are also processed. Both sets only grow from one pass to
//! the next. Only volumes with a reference count above one are ever registered.
//!
//! The number of passes is capped by [`ResolveOptions::max_iterations`]. Hitting
//! the cap is not an error: the partial result is returned, [`Resolution::converged`]
//! is `false`, and a warning is logged.

use alloc::vec;
use alloc::vec::Vec;

use tracing::{debug, warn};

use crate::error::GraphError;
use crate::graph::PlacementGraph;
use crate::types::{NodeId, VolumeId};

/// Default cap on resolver passes.
///
/// On acyclic input the resolver settles after two passes; the cap only guards
/// against malformed graphs.
pub const DEFAULT_MAX_ITERATIONS: u32 = 64;

/// Resolver configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Maximum number of passes over the graph. Values below one are treated as one.
    pub max_iterations: u32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Diagnostic summary of a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Volumes marked processed.
    pub processed_count: usize,
    /// Volumes registered for independent instancing.
    pub independent_count: usize,
    /// Passes performed.
    pub iterations_used: u32,
    /// Whether the last pass changed nothing.
    pub converged: bool,
    /// Sum of descendant counts over registered volumes.
    pub instanced_children: u64,
    /// Sum of `references × (descendants + 1)` over registered volumes.
    pub instanced_total: u64,
}

/// Reference counts and sharing marks for the graph reachable from one root.
///
/// Computed fresh per build session. A resolution describes the graph at the
/// [revision](PlacementGraph::revision) it was computed from; see [`Resolution::is_current`].
#[derive(Clone, Debug)]
pub struct Resolution {
    root: NodeId,
    revision: u64,
    volume_refs: Vec<u32>,
    node_paths: Vec<u64>,
    descendants: Vec<u64>,
    processed: Vec<bool>,
    independent: Vec<bool>,
    registered: Vec<VolumeId>,
    growth: Vec<usize>,
    iterations: u32,
    converged: bool,
    cyclic: bool,
    reachable_nodes: usize,
}

impl Resolution {
    /// Root the resolution was computed from.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `graph` has not been edited since this resolution was computed.
    pub fn is_current<S>(&self, graph: &PlacementGraph<S>) -> bool {
        self.revision == graph.revision()
    }

    /// Number of distinct reachable nodes placing `volume`.
    pub fn reference_count(&self, volume: VolumeId) -> u32 {
        self.volume_refs.get(volume.idx()).copied().unwrap_or(0)
    }

    /// Number of distinct paths from the root reaching `node` (saturating).
    pub fn path_count(&self, node: NodeId) -> u64 {
        self.node_paths.get(node.idx()).copied().unwrap_or(0)
    }

    /// Number of node occurrences below `volume` in the fully expanded tree (saturating).
    pub fn descendant_count(&self, volume: VolumeId) -> u64 {
        self.descendants.get(volume.idx()).copied().unwrap_or(0)
    }

    /// Whether `volume` is marked processed.
    pub fn is_processed(&self, volume: VolumeId) -> bool {
        self.processed.get(volume.idx()).copied().unwrap_or(false)
    }

    /// Whether `volume` needs independent instancing.
    pub fn needs_independent_processing(&self, volume: VolumeId) -> bool {
        self.independent.get(volume.idx()).copied().unwrap_or(false)
    }

    /// Registered volumes, in registration order.
    pub fn independent_volumes(&self) -> &[VolumeId] {
        &self.registered
    }

    /// Size of the processed set after each pass.
    pub fn growth(&self) -> &[usize] {
        &self.growth
    }

    /// Passes performed.
    pub fn iterations_used(&self) -> u32 {
        self.iterations
    }

    /// Whether resolution stopped because a pass changed nothing, rather than at the cap.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Whether a cycle was found below the root.
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// Number of distinct nodes reachable from the root, the root included.
    pub fn reachable_nodes(&self) -> usize {
        self.reachable_nodes
    }

    /// Diagnostic summary.
    pub fn summary(&self) -> ResolveSummary {
        let mut instanced_children = 0_u64;
        let mut instanced_total = 0_u64;
        for &v in &self.registered {
            let desc = self.descendant_count(v);
            instanced_children = instanced_children.saturating_add(desc);
            instanced_total = instanced_total.saturating_add(
                u64::from(self.reference_count(v)).saturating_mul(desc.saturating_add(1)),
            );
        }
        ResolveSummary {
            processed_count: self.processed.iter().filter(|p| **p).count(),
            independent_count: self.registered.len(),
            iterations_used: self.iterations,
            converged: self.converged,
            instanced_children,
            instanced_total,
        }
    }
}

/// Depth-first walk of the nodes reachable from a root.
pub(crate) struct Walk {
    /// Reachable nodes, children before parents.
    pub(crate) post_order: Vec<NodeId>,
    /// Whether a back edge was seen.
    pub(crate) cyclic: bool,
}

/// Iterative post-order walk. `root` must be a valid node of `graph`.
pub(crate) fn walk<S>(graph: &PlacementGraph<S>, root: NodeId) -> Walk {
    const NEW: u8 = 0;
    const OPEN: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![NEW; graph.node_count()];
    let mut post_order = Vec::new();
    let mut cyclic = false;
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    state[root.idx()] = OPEN;

    while let Some(top) = stack.last_mut() {
        let (node, cursor) = *top;
        if let Some(&child) = graph.children_of(node).get(cursor) {
            top.1 += 1;
            match state[child.idx()] {
                NEW => {
                    state[child.idx()] = OPEN;
                    stack.push((child, 0));
                }
                OPEN => cyclic = true,
                _ => {}
            }
        } else {
            state[node.idx()] = DONE;
            post_order.push(node);
            stack.pop();
        }
    }

    Walk { post_order, cyclic }
}

struct Marks {
    processed: Vec<bool>,
    independent: Vec<bool>,
    registered: Vec<VolumeId>,
}

impl Marks {
    fn register(&mut self, v: VolumeId) -> bool {
        if self.independent[v.idx()] {
            return false;
        }
        self.independent[v.idx()] = true;
        self.processed[v.idx()] = true;
        self.registered.push(v);
        true
    }

    fn process(&mut self, v: VolumeId) -> bool {
        !core::mem::replace(&mut self.processed[v.idx()], true)
    }
}

/// Count references below `root` and mark shared subtrees.
///
/// Read-only with respect to the graph; safe to call at any time, for example
/// to size a build before starting it.
pub fn resolve_shared_subtrees<S>(
    graph: &PlacementGraph<S>,
    root: NodeId,
    options: ResolveOptions,
) -> Result<Resolution, GraphError> {
    if graph.node(root).is_none() {
        return Err(GraphError::UnknownNode(root));
    }
    let Walk { post_order, cyclic } = walk(graph, root);
    if cyclic {
        warn!(?root, "placement graph has a cycle below the root; counts are partial");
    }

    let volume_of = |n: NodeId| graph.volume_of(n).unwrap_or(VolumeId(0));
    let nv = graph.volume_count();
    let nn = graph.node_count();

    let mut volume_refs = vec![0_u32; nv];
    for &n in &post_order {
        let v = volume_of(n).idx();
        volume_refs[v] = volume_refs[v].saturating_add(1);
    }

    // Path counts in topological order; back edges of a cyclic graph are ignored.
    let mut rank = vec![usize::MAX; nn];
    for (i, &n) in post_order.iter().rev().enumerate() {
        rank[n.idx()] = i;
    }
    let mut node_paths = vec![0_u64; nn];
    node_paths[root.idx()] = 1;
    for &n in post_order.iter().rev() {
        let paths = node_paths[n.idx()];
        for &c in graph.children_of(n) {
            if rank[c.idx()] > rank[n.idx()] {
                node_paths[c.idx()] = node_paths[c.idx()].saturating_add(paths);
            }
        }
    }

    // Volumes in post-order of their first completed placement.
    let mut descendants = vec![0_u64; nv];
    let mut seen = vec![false; nv];
    let mut volume_order = Vec::new();
    for &n in &post_order {
        let v = volume_of(n);
        if core::mem::replace(&mut seen[v.idx()], true) {
            continue;
        }
        volume_order.push(v);
        descendants[v.idx()] = graph.children_of(n).iter().fold(0_u64, |acc, &c| {
            acc.saturating_add(1)
                .saturating_add(descendants[volume_of(c).idx()])
        });
    }

    let mut marks = Marks {
        processed: vec![false; nv],
        independent: vec![false; nv],
        registered: Vec::new(),
    };
    let max_iterations = options.max_iterations.max(1);
    let mut growth = Vec::new();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;
        let mut changed = false;
        for &v in &volume_order {
            let kids = graph.volume(v).map(|vol| vol.children()).unwrap_or(&[]);
            let mut child_processed = false;
            let mut shared_children = 0_usize;
            for &c in kids {
                let cv = volume_of(c);
                child_processed |= marks.processed[cv.idx()];
                if volume_refs[cv.idx()] > 1 {
                    shared_children += 1;
                }
            }
            let many_shared = shared_children > 1;
            if many_shared {
                for &c in kids {
                    let cv = volume_of(c);
                    if volume_refs[cv.idx()] > 1 {
                        changed |= marks.register(cv);
                    }
                }
            }
            if volume_refs[v.idx()] > 1 {
                changed |= marks.register(v);
            }
            if child_processed || many_shared {
                changed |= marks.process(v);
            }
        }
        let processed = marks.processed.iter().filter(|p| **p).count();
        debug!(iteration = iterations, processed, "resolver pass");
        growth.push(processed);
        if !changed {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            ?root,
            iterations, "shared-subtree resolution hit the iteration cap before converging"
        );
    }

    Ok(Resolution {
        root,
        revision: graph.revision(),
        volume_refs,
        node_paths,
        descendants,
        processed: marks.processed,
        independent: marks.independent,
        registered: marks.registered,
        growth,
        iterations,
        converged,
        cyclic,
        reachable_nodes: post_order.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Node, Volume};

    /// world ─┬─ a1 → A ─ c → C
    ///        └─ a2 → A
    fn shared_pair() -> (PlacementGraph<()>, NodeId, [VolumeId; 3]) {
        let mut g = PlacementGraph::new();
        let world = g.add_volume(Volume::new("world", None));
        let a = g.add_volume(Volume::new("A", None));
        let c = g.add_volume(Volume::new("C", None));
        let root = g.add_root(world).unwrap();
        g.place(world, Node::new("a1", a)).unwrap();
        g.place(world, Node::new("a2", a)).unwrap();
        g.place(a, Node::new("c", c)).unwrap();
        (g, root, [world, a, c])
    }

    #[test]
    fn counts_references_and_paths() {
        let (g, root, [world, a, c]) = shared_pair();
        let r = resolve_shared_subtrees(&g, root, ResolveOptions::default()).unwrap();
        assert_eq!(r.reference_count(world), 1);
        assert_eq!(r.reference_count(a), 2);
        assert_eq!(r.reference_count(c), 1, "one node places C");
        let c_node = g.children_of(g.children_of(root)[0])[0];
        assert_eq!(r.path_count(c_node), 2, "C is reached through both placements of A");
        assert_eq!(r.descendant_count(world), 4);
        assert_eq!(r.descendant_count(a), 1);
        assert_eq!(r.reachable_nodes(), 4);
    }

    #[test]
    fn shared_volume_is_registered_and_parent_processed() {
        let (g, root, [world, a, c]) = shared_pair();
        let r = resolve_shared_subtrees(&g, root, ResolveOptions::default()).unwrap();
        assert!(r.needs_independent_processing(a));
        assert!(!r.needs_independent_processing(c));
        assert!(!r.needs_independent_processing(world));
        assert!(r.is_processed(world), "two shared children force the parent");
        assert!(!r.is_processed(c));
        assert!(r.converged());
        assert_eq!(r.iterations_used(), 2);
        assert_eq!(r.independent_volumes(), &[a]);

        let s = r.summary();
        assert_eq!(s.independent_count, 1);
        assert_eq!(s.processed_count, 2);
        assert_eq!(s.instanced_children, 1);
        assert_eq!(s.instanced_total, 4);
    }

    #[test]
    fn single_shared_child_propagates_through_processed_mark() {
        // world ─ p → P ─┬─ x1 → X
        //                └─ q → Q ─ x2 → X
        let mut g: PlacementGraph<()> = PlacementGraph::new();
        let world = g.add_volume(Volume::new("world", None));
        let p = g.add_volume(Volume::new("P", None));
        let q = g.add_volume(Volume::new("Q", None));
        let x = g.add_volume(Volume::new("X", None));
        let root = g.add_root(world).unwrap();
        g.place(world, Node::new("p", p)).unwrap();
        g.place(p, Node::new("x1", x)).unwrap();
        g.place(p, Node::new("q", q)).unwrap();
        g.place(q, Node::new("x2", x)).unwrap();

        let r = resolve_shared_subtrees(&g, root, ResolveOptions::default()).unwrap();
        assert!(r.needs_independent_processing(x));
        assert!(r.is_processed(q), "Q holds a processed child");
        assert!(r.is_processed(p));
        assert!(r.is_processed(world));
        for v in [world, p, q] {
            assert!(!r.needs_independent_processing(v), "{v:?} is placed once");
        }
    }

    #[test]
    fn growth_is_monotone() {
        let (g, root, _) = shared_pair();
        let r = resolve_shared_subtrees(&g, root, ResolveOptions::default()).unwrap();
        assert!(r.growth().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn cap_reports_non_convergence() {
        let (g, root, [_, a, _]) = shared_pair();
        let r = resolve_shared_subtrees(&g, root, ResolveOptions { max_iterations: 1 }).unwrap();
        assert!(!r.converged(), "one pass cannot confirm a fixed point");
        assert_eq!(r.iterations_used(), 1);
        assert!(r.needs_independent_processing(a), "partial result is kept");
    }

    #[test]
    fn cycle_terminates() {
        let mut g: PlacementGraph<()> = PlacementGraph::new();
        let a = g.add_volume(Volume::new("A", None));
        let b = g.add_volume(Volume::new("B", None));
        let root = g.add_root(a).unwrap();
        g.place(a, Node::new("b", b)).unwrap();
        g.place(b, Node::new("a", a)).unwrap();
        let r = resolve_shared_subtrees(&g, root, ResolveOptions { max_iterations: 4 }).unwrap();
        assert!(r.is_cyclic());
        assert!(r.iterations_used() <= 4);
        assert_eq!(r.reference_count(a), 2, "root and the back placement");
    }

    #[test]
    fn staleness_follows_revision() {
        let (mut g, root, [world, ..]) = shared_pair();
        let r = resolve_shared_subtrees(&g, root, ResolveOptions::default()).unwrap();
        assert!(r.is_current(&g));
        g.toggle_visibility(world, crate::VisFlags::THIS);
        assert!(!r.is_current(&g));
    }

    #[test]
    fn unknown_root() {
        let g: PlacementGraph<()> = PlacementGraph::new();
        assert_eq!(
            resolve_shared_subtrees(&g, NodeId(0), ResolveOptions::default()).unwrap_err(),
            GraphError::UnknownNode(NodeId(0))
        );
    }
}
