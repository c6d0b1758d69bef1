// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene bounds and the camera parameters derived from them.

use alloc::vec;

use glam::{DAffine3, DVec2, DVec3};
use tracing::debug;

use crate::tree::SceneTree;
use crate::types::{Aabb, InstanceId};

/// How [`scene_bounds`] combines the boxes of drawn instances.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BoundsPolicy {
    /// Depth-first, stop at the first drawn instance with bounds.
    ///
    /// Cheap and usually an underestimate; the [`ScaleSource`] multipliers
    /// account for that.
    #[default]
    FirstMatch,
    /// Union over every drawn instance in the subtree.
    Union,
}

/// Where the scene came from, which selects the scale multiplier.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ScaleSource {
    /// Built from a placement graph.
    #[default]
    Built,
    /// Supplied pre-built, as a flat extract of shapes.
    Extract,
}

impl ScaleSource {
    /// Factor applied to the largest coordinate of the bounds.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Built => 4.0,
            Self::Extract => 10.0,
        }
    }
}

/// Bounds of the drawn meshes below `root`, in world space.
///
/// Instances that are not drawn contribute nothing themselves, but their
/// children are still searched. Returns `None` if nothing drawn has bounds.
pub fn scene_bounds<M>(tree: &SceneTree<M>, root: InstanceId, policy: BoundsPolicy) -> Option<Aabb> {
    let parent_world = match tree.parent(root) {
        Some(p) => tree.world_transform(p)?,
        None => DAffine3::IDENTITY,
    };
    let mut found = Aabb::EMPTY;
    let mut stack = vec![(root, parent_world)];
    while let Some((id, parent_world)) = stack.pop() {
        let Some(local) = tree.get(id) else {
            continue;
        };
        let world = parent_world * local.transform;
        if local.drawn {
            if let Some(bounds) = local.local_bounds.filter(|b| !b.is_empty()) {
                let bounds = bounds.transformed(&world);
                match policy {
                    BoundsPolicy::FirstMatch => return Some(bounds),
                    BoundsPolicy::Union => found = found.union(&bounds),
                }
            }
        }
        stack.extend(tree.children(id).iter().rev().map(|&c| (c, world)));
    }
    (!found.is_empty()).then_some(found)
}

/// Camera and clipping parameters derived from the overall scene scale.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraSetup {
    /// Overall scene scale.
    pub scale: f64,
    /// Near clipping plane.
    pub near: f64,
    /// Far clipping plane.
    pub far: f64,
    /// Default camera position.
    pub position: DVec3,
    /// Camera up direction.
    pub up: DVec3,
    /// Length of the axis helper.
    pub axis_length: f64,
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self::from_scale(Self::DEFAULT_SCALE)
    }
}

impl CameraSetup {
    /// Scale used before anything has been built.
    pub const DEFAULT_SCALE: f64 = 10.0;

    /// Derive near/far planes and a default position from `scale`.
    ///
    /// The position direction is `(cos 135, cos 45, sin 45)` with the angles
    /// taken in radians.
    pub fn from_scale(scale: f64) -> Self {
        let a = DVec2::from_angle(135.0);
        let b = DVec2::from_angle(45.0);
        Self {
            scale,
            near: scale / 200.0,
            far: scale * 500.0,
            position: DVec3::new(a.x, b.x, b.y) * scale,
            up: DVec3::Y,
            axis_length: 2.0 * scale,
        }
    }

    /// Preset for histogram scenes of half-size `size`.
    pub fn histogram(size: f64) -> Self {
        Self {
            scale: size,
            near: 1.0,
            far: 40.0 * size,
            position: DVec3::new(-3.0, -3.0, 3.0) * size,
            up: DVec3::Z,
            axis_length: 2.0 * size,
        }
    }
}

/// Compute the scene scale below `root` and the camera that goes with it.
///
/// Falls back to [`CameraSetup::default`] when no drawn bounds are found or
/// the resulting scale is not positive.
pub fn calibrate<M>(
    tree: &SceneTree<M>,
    root: InstanceId,
    policy: BoundsPolicy,
    source: ScaleSource,
) -> CameraSetup {
    let Some(bounds) = scene_bounds(tree, root, policy) else {
        debug!(?root, "no drawn bounds; using default camera");
        return CameraSetup::default();
    };
    let scale = source.multiplier() * bounds.max_abs_extent();
    if !(scale > 0.0 && scale.is_finite()) {
        debug!(scale, "degenerate scene scale; using default camera");
        return CameraSetup::default();
    }
    debug!(scale, ?policy, ?source, "calibrated scene scale");
    CameraSetup::from_scale(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LocalInstance;

    fn unit_box(x: f64) -> LocalInstance<()> {
        LocalInstance {
            transform: DAffine3::from_translation(DVec3::new(x, 0.0, 0.0)),
            mesh: Some(()),
            local_bounds: Some(Aabb::from_center_half_extents(DVec3::ZERO, DVec3::ONE)),
            ..Default::default()
        }
    }

    fn scene() -> (SceneTree<()>, InstanceId) {
        let mut tree = SceneTree::new();
        let root = tree.insert(
            None,
            LocalInstance {
                drawn: false,
                ..Default::default()
            },
        );
        tree.insert(Some(root), unit_box(1.0));
        tree.insert(Some(root), unit_box(9.0));
        (tree, root)
    }

    #[test]
    fn first_match_stops_early() {
        let (tree, root) = scene();
        let b = scene_bounds(&tree, root, BoundsPolicy::FirstMatch).unwrap();
        assert_eq!(b.max, DVec3::new(2.0, 1.0, 1.0));
        let u = scene_bounds(&tree, root, BoundsPolicy::Union).unwrap();
        assert_eq!(u.max, DVec3::new(10.0, 1.0, 1.0));
        assert_eq!(u.min, DVec3::new(0.0, -1.0, -1.0));
    }

    #[test]
    fn union_looks_below_drawn_instances() {
        let mut tree = SceneTree::new();
        let root = tree.insert(None, unit_box(0.0));
        tree.insert(Some(root), unit_box(50.0));
        let first = scene_bounds(&tree, root, BoundsPolicy::FirstMatch).unwrap();
        assert_eq!(first.max, DVec3::ONE);
        let all = scene_bounds(&tree, root, BoundsPolicy::Union).unwrap();
        assert_eq!(all.max, DVec3::new(51.0, 1.0, 1.0));
        assert_eq!(all.min, DVec3::splat(-1.0));
    }

    #[test]
    fn hidden_children_are_skipped() {
        let (mut tree, root) = scene();
        let first = tree.children(root)[0];
        tree.set_drawn(first, false);
        let b = scene_bounds(&tree, root, BoundsPolicy::FirstMatch).unwrap();
        assert_eq!(b.max.x, 10.0);
    }

    #[test]
    fn scale_and_planes() {
        let (tree, root) = scene();
        let cam = calibrate(&tree, root, BoundsPolicy::FirstMatch, ScaleSource::Built);
        assert_eq!(cam.scale, 8.0);
        assert_eq!(cam.near, 8.0 / 200.0);
        assert_eq!(cam.far, 4000.0);
        assert_eq!(cam.axis_length, 16.0);
        // cos(135), cos(45), sin(45) in radians.
        let expected = DVec3::new(-0.996_087_835_141_184_9, 0.525_321_988_817_729_7, 0.850_903_524_534_118_4) * 8.0;
        assert!(
            (cam.position - expected).abs().max_element() < 1e-9,
            "position was {}",
            cam.position
        );

        let extract = calibrate(&tree, root, BoundsPolicy::FirstMatch, ScaleSource::Extract);
        assert_eq!(extract.scale, 20.0);
    }

    #[test]
    fn empty_scene_uses_default() {
        let mut tree: SceneTree<()> = SceneTree::new();
        let root = tree.insert(None, LocalInstance::default());
        let cam = calibrate(&tree, root, BoundsPolicy::Union, ScaleSource::Built);
        assert_eq!(cam, CameraSetup::default());
        assert_eq!(cam.scale, CameraSetup::DEFAULT_SCALE);
    }

    #[test]
    fn histogram_preset() {
        let cam = CameraSetup::histogram(100.0);
        assert_eq!(cam.near, 1.0);
        assert_eq!(cam.far, 4000.0);
        assert_eq!(cam.position, DVec3::new(-300.0, -300.0, 300.0));
        assert_eq!(cam.up, DVec3::Z);
    }
}
