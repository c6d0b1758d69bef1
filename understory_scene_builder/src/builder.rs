// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The resumable traversal that turns a placement graph into a mesh hierarchy.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};
use understory_mesh_tree::{
    CameraSetup, InstanceId, LocalInstance, ScaleSource, SceneTree, calibrate,
};
use understory_placement::{
    GraphError, NodeId, PlacementGraph, Resolution, ResolveOptions, VisFlags, VolumeId,
    resolve_shared_subtrees,
};

use crate::factory::{MeshFactory, MeshMaterial};
use crate::options::BuildOptions;
use crate::report::{BuildProgress, BuildReport, BuildState, BuildWarning, Cutoff};

/// One entry of the explicit work stack.
#[derive(Clone, Debug)]
enum Frame {
    /// The root node, not yet visited.
    Enter {
        node: NodeId,
        container: Option<InstanceId>,
        budget: u32,
    },
    /// Children of a built instance, visited one per step.
    Children {
        instance: InstanceId,
        node: NodeId,
        volume: VolumeId,
        depth: u32,
        /// Levels still allowed below `instance`; always above zero.
        budget: u32,
        /// Whether `instance` or an ancestor has daughters visible.
        daughters: bool,
        cursor: usize,
        skipped: usize,
    },
}

/// A built instance kept for reuse by later placements of the same node.
#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    instance: InstanceId,
    budget: u32,
    daughters: bool,
    complete: bool,
}

#[derive(Clone, Copy, Debug)]
struct Visit {
    node: NodeId,
    container: Option<InstanceId>,
    depth: u32,
    budget: u32,
    daughters: bool,
    /// Volume whose child list holds `node`; `None` for the root.
    owner: Option<VolumeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Built(InstanceId),
    Copied,
    Skipped,
}

/// A build session over one placement graph and one target tree.
///
/// The session holds the target [`SceneTree`] mutably, so only one session per
/// tree can be active. Drive it with [`SceneBuilder::run_for`] from a host loop,
/// or with [`SceneBuilder::run_to_completion`]. Stopping early with
/// [`SceneBuilder::cancel`] leaves every instance attached so far in place.
///
/// Volumes placed more than once are built the first time their node is met
/// and copied structurally afterwards, so every occurrence owns its instances.
pub struct SceneBuilder<'a, S, F: MeshFactory<S>> {
    graph: &'a PlacementGraph<S>,
    tree: &'a mut SceneTree<F::Mesh>,
    factory: &'a mut F,
    options: BuildOptions,
    resolution: Resolution,
    stack: Vec<Frame>,
    cache: HashMap<NodeId, CacheEntry>,
    root: Option<InstanceId>,
    started: Instant,
    progress: BuildProgress,
    warnings: Vec<BuildWarning>,
    cutoff: Option<Cutoff>,
    state: BuildState,
}

impl<S, F: MeshFactory<S>> core::fmt::Debug for SceneBuilder<'_, S, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SceneBuilder")
            .field("state", &self.state)
            .field("progress", &self.progress)
            .field("cached", &self.cache.len())
            .field("warnings", &self.warnings.len())
            .field("cutoff", &self.cutoff)
            .finish_non_exhaustive()
    }
}

impl<'a, S, F: MeshFactory<S>> SceneBuilder<'a, S, F> {
    /// Resolve shared subtrees below `root` and prepare a session.
    ///
    /// Nothing is built until the first [`SceneBuilder::run_for`]. The root
    /// instance becomes a root of `tree` unless [`SceneBuilder::with_container`]
    /// is used.
    #[instrument(level = "debug", skip(graph, tree, factory, options))]
    pub fn start(
        graph: &'a PlacementGraph<S>,
        root: NodeId,
        tree: &'a mut SceneTree<F::Mesh>,
        factory: &'a mut F,
        options: BuildOptions,
    ) -> Result<Self, GraphError> {
        let resolution = resolve_shared_subtrees(
            graph,
            root,
            ResolveOptions {
                max_iterations: options.resolve_iterations,
            },
        )?;
        let mut warnings = Vec::new();
        if resolution.is_cyclic() {
            warnings.push(BuildWarning::Cycle);
        }
        if !resolution.converged() {
            warnings.push(BuildWarning::ResolverCap {
                iterations: resolution.iterations_used(),
            });
        }
        debug!(
            independent = resolution.independent_volumes().len(),
            reachable = resolution.reachable_nodes(),
            "resolved shared subtrees"
        );
        let stack = vec![Frame::Enter {
            node: root,
            container: None,
            budget: options.depth_budget(),
        }];
        Ok(Self {
            graph,
            tree,
            factory,
            options,
            resolution,
            stack,
            cache: HashMap::new(),
            root: None,
            started: Instant::now(),
            progress: BuildProgress::default(),
            warnings,
            cutoff: None,
            state: BuildState::Idle,
        })
    }

    /// Attach the root instance under `container` instead of at the top of the tree.
    ///
    /// Has no effect once the root has been visited.
    #[must_use]
    pub fn with_container(mut self, container: InstanceId) -> Self {
        if let Some(Frame::Enter { container: c, .. }) = self.stack.first_mut() {
            *c = Some(container);
        }
        self
    }

    /// Current state.
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Counters so far.
    pub fn progress(&self) -> BuildProgress {
        BuildProgress {
            pending_frames: self.stack.len(),
            ..self.progress
        }
    }

    /// Warnings met so far.
    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// Shared-subtree resolution used by this session.
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// The instance built for the root node, once visited.
    pub fn root_instance(&self) -> Option<InstanceId> {
        self.root
    }

    /// Visit frames until the stack empties, a cutoff triggers, or `slice` has elapsed.
    ///
    /// At least one frame is processed per call, so a zero slice still makes
    /// progress. Calling again after [`BuildState::Suspended`] continues from
    /// the exact stack state.
    pub fn run_for(&mut self, slice: Duration) -> BuildState {
        if self.state == BuildState::Complete {
            return self.state;
        }
        let slice_start = Instant::now();
        loop {
            if self.stack.is_empty() {
                self.state = BuildState::Complete;
                break;
            }
            if let Some(cutoff) = self.check_cutoff() {
                info!(?cutoff, visits = self.progress.visits, "stopping expansion");
                self.cutoff = Some(cutoff);
                self.stack.clear();
                self.state = BuildState::Complete;
                break;
            }
            self.step();
            if slice_start.elapsed() >= slice {
                self.state = if self.stack.is_empty() {
                    BuildState::Complete
                } else {
                    BuildState::Suspended
                };
                break;
            }
        }
        if self.state == BuildState::Suspended {
            debug!(visits = self.progress.visits, "creating geometry");
        }
        self.state
    }

    /// Drive the session in slices of [`BuildOptions::time_slice`] and finish it.
    pub fn run_to_completion(mut self) -> BuildReport {
        let slice = self.options.time_slice;
        while self.run_for(slice) != BuildState::Complete {}
        self.finish()
    }

    /// Stop the session, keeping whatever was attached so far.
    pub fn cancel(self) -> BuildReport {
        if self.state != BuildState::Complete {
            info!(
                visits = self.progress.visits,
                pending = self.stack.len(),
                "scene build cancelled"
            );
        }
        self.finish()
    }

    /// End the session and calibrate the camera on what was built.
    ///
    /// If work remains, the report is marked cancelled.
    pub fn finish(self) -> BuildReport {
        let camera = match self.root {
            Some(root) => calibrate(
                self.tree,
                root,
                self.options.bounds_policy,
                ScaleSource::Built,
            ),
            None => CameraSetup::default(),
        };
        let report = BuildReport {
            root: self.root,
            progress: BuildProgress {
                pending_frames: self.stack.len(),
                ..self.progress
            },
            warnings: self.warnings,
            cutoff: self.cutoff,
            cancelled: self.state != BuildState::Complete,
            elapsed: self.started.elapsed(),
            resolution: self.resolution.summary(),
            camera,
        };
        info!(
            visits = report.progress.visits,
            built = report.progress.built,
            copied = report.progress.copied,
            skipped = report.progress.skipped,
            scale = report.camera.scale,
            elapsed_ms = report.elapsed.as_millis(),
            "scene build finished"
        );
        report
    }

    fn check_cutoff(&self) -> Option<Cutoff> {
        if self
            .options
            .node_budget
            .is_some_and(|budget| self.progress.visits >= budget)
        {
            return Some(Cutoff::NodeBudget);
        }
        if self
            .options
            .time_limit
            .is_some_and(|limit| self.started.elapsed() >= limit)
        {
            return Some(Cutoff::TimeLimit);
        }
        None
    }

    fn step(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Enter {
                node,
                container,
                budget,
            } => {
                let outcome = self.visit(Visit {
                    node,
                    container,
                    depth: 0,
                    budget,
                    daughters: false,
                    owner: None,
                });
                if let Outcome::Built(id) = outcome {
                    self.root = Some(id);
                }
            }
            Frame::Children {
                instance,
                node,
                volume,
                depth,
                budget,
                daughters,
                cursor,
                skipped,
            } => {
                let Some(&child) = self.graph.children_of(node).get(cursor) else {
                    if let Some(entry) = self.cache.get_mut(&node) {
                        if entry.instance == instance {
                            entry.complete = true;
                        }
                    }
                    return;
                };
                let slot = self.stack.len();
                self.stack.push(Frame::Children {
                    instance,
                    node,
                    volume,
                    depth,
                    budget,
                    daughters,
                    cursor: cursor + 1,
                    skipped,
                });
                let outcome = self.visit(Visit {
                    node: child,
                    container: Some(instance),
                    depth: depth + 1,
                    budget: budget - 1,
                    daughters,
                    owner: Some(volume),
                });
                if outcome == Outcome::Skipped {
                    if let Some(Frame::Children { skipped, .. }) = self.stack.get_mut(slot) {
                        *skipped += 1;
                    }
                }
            }
        }
    }

    fn visit(&mut self, v: Visit) -> Outcome {
        self.progress.visits += 1;
        let cacheable = v
            .owner
            .is_some_and(|owner| self.resolution.is_processed(owner));

        if cacheable {
            if let Some(entry) = self.cache.get(&v.node) {
                if entry.complete && entry.budget == v.budget && entry.daughters == v.daughters {
                    if self.tree.copy_subtree(entry.instance, v.container).is_some() {
                        self.progress.copied += 1;
                        return Outcome::Copied;
                    }
                }
            }
        }

        let graph = self.graph;
        let Some(node) = graph.node(v.node) else {
            return self.skip(BuildWarning::Placement {
                node: v.node,
                name: String::new(),
                source: GraphError::UnknownNode(v.node),
            });
        };
        let Some(volume) = graph.volume(node.volume) else {
            return self.skip(BuildWarning::Placement {
                node: v.node,
                name: node.name.clone(),
                source: GraphError::UnknownVolume(node.volume),
            });
        };
        let transform = match node.resolve_transform() {
            Ok(t) => t,
            Err(source) => {
                return self.skip(BuildWarning::Placement {
                    node: v.node,
                    name: node.name.clone(),
                    source,
                });
            }
        };

        let drawn = self
            .options
            .draw_policy
            .is_drawn(volume.vis, v.depth, v.daughters);
        let opacity = volume
            .material
            .and_then(|m| m.opacity())
            .unwrap_or(if drawn { 1.0 } else { 0.0 });
        let material = MeshMaterial {
            color: volume.line_color,
            opacity,
            transparent: opacity < 1.0,
            visible: drawn,
        };

        let (mesh, local_bounds) = match &volume.shape {
            Some(shape) => match self.factory.create_mesh(shape, &material) {
                Ok(mesh) => {
                    let bounds = self.factory.local_bounds(&mesh);
                    (Some(mesh), bounds)
                }
                Err(source) => {
                    return self.skip(BuildWarning::Mesh {
                        node: v.node,
                        name: node.name.clone(),
                        source,
                    });
                }
            },
            None => (None, None),
        };

        let instance = self.tree.insert(
            v.container,
            LocalInstance {
                name: node.name.clone(),
                transform: transform.to_affine(),
                drawn,
                opacity,
                source: Some(v.node),
                mesh,
                local_bounds,
            },
        );
        self.progress.built += 1;

        let recurring = self.resolution.is_cyclic() && self.on_ancestor_chain(node.volume);
        if recurring {
            debug!(node = ?v.node, name = %node.name, "volume repeats an ancestor; not expanding");
        }
        let expand = v.budget > 0 && !recurring && !graph.children_of(v.node).is_empty();
        if cacheable {
            self.cache.insert(
                v.node,
                CacheEntry {
                    instance,
                    budget: v.budget,
                    daughters: v.daughters,
                    complete: !expand,
                },
            );
        }
        if expand {
            self.stack.push(Frame::Children {
                instance,
                node: v.node,
                volume: node.volume,
                depth: v.depth,
                budget: v.budget,
                daughters: v.daughters || volume.vis.contains(VisFlags::DAUGHTERS),
                cursor: 0,
                skipped: 0,
            });
        }
        Outcome::Built(instance)
    }

    /// Whether `volume` is already being expanded further up the stack.
    ///
    /// Every `Children` frame on the stack belongs to an ancestor of the node
    /// being visited.
    fn on_ancestor_chain(&self, volume: VolumeId) -> bool {
        self.stack
            .iter()
            .any(|f| matches!(f, Frame::Children { volume: v, .. } if *v == volume))
    }

    fn skip(&mut self, warning: BuildWarning) -> Outcome {
        warn!(%warning, "skipping node");
        self.progress.skipped += 1;
        self.warnings.push(warning);
        Outcome::Skipped
    }
}

/// Build the scene below `root` in one call, honoring the cutoffs in `options`.
pub fn build_scene<S, F: MeshFactory<S>>(
    graph: &PlacementGraph<S>,
    root: NodeId,
    tree: &mut SceneTree<F::Mesh>,
    factory: &mut F,
    options: BuildOptions,
) -> Result<BuildReport, GraphError> {
    Ok(SceneBuilder::start(graph, root, tree, factory, options)?.run_to_completion())
}
