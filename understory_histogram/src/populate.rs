// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use glam::DAffine3;
use tracing::{debug, instrument, warn};
use understory_mesh_tree::{CameraSetup, InstanceId, LocalInstance, SceneTree};
use understory_scene_builder::{MeshError, MeshFactory, MeshMaterial};

use crate::project::{BinPlacement, BinShape};

/// Result of attaching projected bins to a scene.
#[derive(Clone, Debug)]
pub struct Populated {
    /// Container holding one instance per created bin.
    pub container: InstanceId,
    /// Bins that received a mesh.
    pub created: usize,
    /// Bins the factory refused, by position in the input slice.
    pub failed: Vec<(usize, MeshError)>,
    /// Camera preset for the drawing cube.
    pub camera: CameraSetup,
}

/// Create one instance per bin under a new container named `histogram`.
///
/// `size` is the half-width the bins were projected with; it selects the
/// camera preset. Bins the factory refuses are skipped and listed in
/// [`Populated::failed`].
#[instrument(level = "debug", skip_all, fields(bins = bins.len()))]
pub fn populate<F: MeshFactory<BinShape>>(
    tree: &mut SceneTree<F::Mesh>,
    parent: Option<InstanceId>,
    bins: &[BinPlacement],
    factory: &mut F,
    color: u16,
    size: f64,
) -> Populated {
    let container = tree.insert(
        parent,
        LocalInstance {
            name: "histogram".into(),
            drawn: false,
            ..LocalInstance::default()
        },
    );
    let material = MeshMaterial {
        color,
        opacity: 1.0,
        transparent: false,
        visible: true,
    };

    let mut created = 0;
    let mut failed = Vec::new();
    for (n, bin) in bins.iter().enumerate() {
        match factory.create_mesh(&bin.shape, &material) {
            Ok(mesh) => {
                let local_bounds = factory.local_bounds(&mesh);
                let [i, j, k] = bin.index;
                tree.insert(
                    Some(container),
                    LocalInstance {
                        name: format!("bin_{i}_{j}_{k}"),
                        transform: DAffine3::from_translation(bin.position),
                        mesh: Some(mesh),
                        local_bounds,
                        ..LocalInstance::default()
                    },
                );
                created += 1;
            }
            Err(err) => {
                warn!(%err, index = ?bin.index, "skipping bin");
                failed.push((n, err));
            }
        }
    }
    debug!(created, failed = failed.len(), "populated histogram");
    Populated {
        container,
        created,
        failed,
        camera: CameraSetup::histogram(size),
    }
}
