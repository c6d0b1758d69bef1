// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for placement graphs: identifiers, visibility bits, materials, and transforms.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use glam::{DAffine3, DMat3, DVec2, DVec3};

/// Identifier of a [`Volume`](crate::Volume) in a [`PlacementGraph`](crate::PlacementGraph).
///
/// Graphs are append-only, so a `VolumeId` stays valid for the lifetime of the graph that issued it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct VolumeId(pub(crate) u32);

impl VolumeId {
    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Raw slot index, useful as a dense key in side tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a [`Node`](crate::Node) in a [`PlacementGraph`](crate::PlacementGraph).
///
/// A node is a single placement. It is never owned by more than one volume,
/// but it is *reached* once per path through the volumes above it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Raw slot index, useful as a dense key in side tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Visibility attribute bits attached to a volume.
    ///
    /// The bit positions match the geometry attribute word of the source format,
    /// so values read from files can be passed through [`VisFlags::from_bits_retain`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct VisFlags: u32 {
        /// Attributes of the volume are overridden.
        const OVERRIDE   = 1 << 0;
        /// The volume is invisible, as well as its daughters.
        const NONE       = 1 << 1;
        /// This volume is visible.
        const THIS       = 1 << 2;
        /// All leaves below this volume are visible.
        const DAUGHTERS  = 1 << 3;
        /// First-level daughters are visible.
        const ONE_LEVEL  = 1 << 4;
        /// Attributes were streamed.
        const STREAMED   = 1 << 5;
        /// Attributes were changed after the geometry was closed.
        const TOUCHED    = 1 << 6;
        /// The volume is visible on screen.
        const ON_SCREEN  = 1 << 7;
        /// All containers are visible.
        const CONTAINERS = 1 << 12;
        /// Only this volume is visible.
        const ONLY       = 1 << 13;
        /// Only a given branch is visible.
        const BRANCH     = 1 << 14;
        /// Ray-tracing flag.
        const RAYTRACE   = 1 << 15;
    }
}

impl Default for VisFlags {
    fn default() -> Self {
        Self::THIS | Self::DAUGHTERS
    }
}

impl VisFlags {
    /// Mask applied when toggling bits; the high byte of the attribute word is reserved.
    pub const TOGGLE_MASK: u32 = 0x00ff_ffff;

    /// Flip `bits` (restricted to [`Self::TOGGLE_MASK`]) and return the result.
    #[must_use]
    pub fn toggled(self, bits: Self) -> Self {
        Self::from_bits_retain(self.bits() ^ (bits.bits() & Self::TOGGLE_MASK))
    }
}

/// Fill styles in this range encode transparency as `style - 3000` percent.
const TRANSPARENT_FILL: core::ops::RangeInclusive<u32> = 3000..=3100;

/// Material attributes of a volume that influence how it is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Material {
    /// Fill style code. Styles `3000..=3100` encode a transparency percentage.
    pub fill_style: u32,
    /// Fill colour index.
    pub fill_color: u16,
}

impl Material {
    /// Transparency percentage encoded by the fill style, `0` when opaque.
    pub fn transparency(&self) -> u32 {
        if TRANSPARENT_FILL.contains(&self.fill_style) {
            self.fill_style - 3000
        } else {
            0
        }
    }

    /// Opacity in `[0, 1]` when the fill style requests transparency.
    ///
    /// Returns `None` for opaque fill styles, leaving opacity to the drawn state.
    pub fn opacity(&self) -> Option<f64> {
        let t = self.transparency();
        (t > 0).then(|| f64::from(100 - t) / 100.0)
    }
}

/// Local rigid placement: a rotation followed by a translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Rotation matrix.
    pub rotation: DMat3,
    /// Translation vector.
    pub translation: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No rotation, no translation.
    pub const IDENTITY: Self = Self {
        rotation: DMat3::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Create a transform from a rotation and a translation.
    pub const fn new(rotation: DMat3, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    pub const fn from_translation(translation: DVec3) -> Self {
        Self::new(DMat3::IDENTITY, translation)
    }

    /// Pure rotation.
    pub const fn from_rotation(rotation: DMat3) -> Self {
        Self::new(rotation, DVec3::ZERO)
    }

    /// Rotation given as nine row-major coefficients, as stored by the source format.
    pub fn from_rotation_rows(rows: [f64; 9]) -> Self {
        Self::from_rotation(DMat3::from_cols_array(&rows).transpose())
    }

    /// Affine matrix equivalent to this transform.
    pub fn to_affine(&self) -> DAffine3 {
        DAffine3::from_mat3_translation(self.rotation, self.translation)
    }

    /// Apply the transform to a point.
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.rotation * p + self.translation
    }
}

/// Division pattern used to derive the placement of a divided volume's cells.
#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    /// Division in azimuth around Z.
    CylPhi {
        /// Start angle in degrees.
        start: f64,
        /// Cell width in degrees.
        step: f64,
        /// Optional precomputed `[sin0, cos0, sin1, cos1, ...]` per cell.
        sin_cos: Option<Vec<f64>>,
    },
    /// Any other pattern; carries the pattern type name for diagnostics.
    Other(String),
}

impl Pattern {
    /// Type name of the pattern as reported in warnings.
    pub fn name(&self) -> &str {
        match self {
            Self::CylPhi { .. } => "CylPhi",
            Self::Other(name) => name,
        }
    }

    /// `(sin, cos)` of the centre angle of cell `index`, if the pattern is azimuthal.
    pub(crate) fn cyl_phi_sin_cos(&self, index: u32) -> Option<(f64, f64)> {
        let Self::CylPhi {
            start,
            step,
            sin_cos,
        } = self
        else {
            return None;
        };
        let i = index as usize;
        if let Some(table) = sin_cos {
            if let (Some(&s), Some(&c)) = (table.get(2 * i), table.get(2 * i + 1)) {
                return Some((s, c));
            }
        }
        let degrees = start + (f64::from(index) + 0.5) * step;
        let dir = DVec2::from_angle(degrees * (core::f64::consts::PI / 180.0));
        Some((dir.y, dir.x))
    }
}

/// Placement of one cell of a divided volume.
///
/// Cells of the same division share one [`Pattern`].
#[derive(Clone, Debug, PartialEq)]
pub struct Division {
    /// Shared division pattern.
    pub pattern: Arc<Pattern>,
    /// Cell index within the division.
    pub index: u32,
}
