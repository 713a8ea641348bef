//! Core data types for splat batches.
//!
//! These are CPU-side representations. The packed GPU layout with bytemuck
//! derives lives in splatview-gpu.

use glam::{Vec3, Vec4};

/// One point-cloud sample, rendered as a soft circular sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splat {
    /// Center position in world space.
    pub position: Vec3,
    /// RGBA color, every channel in 0-1.
    pub color: Vec4,
    /// Per-axis scale. Isotropic splats carry the same value on every axis.
    pub scale: Vec3,
    /// Opacity (0-1), multiplied into the color alpha when shading.
    pub opacity: f32,
}

impl Splat {
    /// Create a splat, clamping color and opacity into 0-1 and scale to be non-negative.
    pub fn new(position: Vec3, color: Vec4, scale: Vec3, opacity: f32) -> Self {
        Self {
            position,
            color: color.clamp(Vec4::ZERO, Vec4::ONE),
            scale: scale.max(Vec3::ZERO),
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Create an isotropic splat with the same scale on all three axes.
    pub fn isotropic(position: Vec3, color: Vec4, scale: f32, opacity: f32) -> Self {
        Self::new(position, color, Vec3::splat(scale), opacity)
    }

    /// Final alpha the fragment stage starts from.
    pub fn effective_alpha(&self) -> f32 {
        self.color.w * self.opacity
    }
}

/// Immutable set of splats produced by one parse of one file.
///
/// Loading another file builds a new batch; batches are never merged or edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplatBatch {
    splats: Vec<Splat>,
}

impl SplatBatch {
    pub fn new(splats: Vec<Splat>) -> Self {
        Self { splats }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.splats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splats.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Splat> {
        self.splats.iter()
    }

    pub fn as_slice(&self) -> &[Splat] {
        &self.splats
    }

    /// Axis-aligned bounds of all splat centers.
    pub fn bounds(&self) -> SceneBounds {
        SceneBounds::from_positions(self.splats.iter().map(|s| s.position))
    }
}

impl From<Vec<Splat>> for SplatBatch {
    fn from(splats: Vec<Splat>) -> Self {
        Self::new(splats)
    }
}

impl<'a> IntoIterator for &'a SplatBatch {
    type Item = &'a Splat;
    type IntoIter = std::slice::Iter<'a, Splat>;

    fn into_iter(self) -> Self::IntoIter {
        self.splats.iter()
    }
}

/// Scene bounds computed from splat positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

impl SceneBounds {
    /// Compute bounds from an iterator of positions.
    pub fn from_positions(positions: impl Iterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut count = 0;

        for pos in positions {
            min = min.min(pos);
            max = max.max(pos);
            count += 1;
        }

        if count == 0 {
            return Self::default();
        }

        let center = (min + max) * 0.5;
        let radius = (max - min).length().max(1.0);
        Self {
            min,
            max,
            center,
            radius,
        }
    }
}

impl Default for SceneBounds {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
            center: Vec3::ZERO,
            radius: 1.0,
        }
    }
}
