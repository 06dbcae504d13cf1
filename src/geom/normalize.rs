use glam::Vec2;
use serde::Serialize;

use super::core::bounds;

/// Maps blend-space coordinates into a canonical space spanning roughly
/// `[-1, 1]` on each axis.
///
/// Axes in different units (speed, degrees) would otherwise skew both the
/// triangulation and the nearest-edge search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Normalization {
    pub range_min: Vec2,
    pub range_max: Vec2,
    pub center: Vec2,
    pub scale: Vec2,
}

impl Default for Normalization {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Normalization {
    pub const IDENTITY: Self = Self {
        range_min: Vec2::ZERO,
        range_max: Vec2::ZERO,
        center: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    /// Builds the normalization from the valid sample positions.
    #[must_use]
    pub fn from_points(points: &[Vec2]) -> Self {
        let Some((min, max)) = bounds(points) else {
            return Self::IDENTITY;
        };

        let axis_scale = |lo: f32, hi: f32| if hi > lo { 2.0 / (hi - lo) } else { 1.0 };

        Self {
            range_min: min,
            range_max: max,
            center: (min + max) * 0.5,
            scale: Vec2::new(axis_scale(min.x, max.x), axis_scale(min.y, max.y)),
        }
    }

    #[must_use]
    pub fn normalize(&self, point: Vec2) -> Vec2 {
        (point - self.center) * self.scale
    }

    #[must_use]
    pub fn denormalize(&self, point: Vec2) -> Vec2 {
        point / self.scale + self.center
    }

    #[must_use]
    pub fn normalize_all(&self, points: &[Vec2]) -> Vec<Vec2> {
        points.iter().map(|p| self.normalize(*p)).collect()
    }
}
