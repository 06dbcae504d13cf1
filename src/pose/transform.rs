use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local joint transform as translation, rotation and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Additive identity used as the start of a weighted sum.
    pub const ZERO: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
        scale: Vec3::ZERO,
    };

    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Accumulates `other * weight`. The incoming rotation is flipped into the
    /// hemisphere of the accumulated rotation so opposite-signed quaternions
    /// do not cancel out.
    pub fn add_weighted(&mut self, other: &Transform, weight: f32) {
        self.translation += other.translation * weight;
        self.scale += other.scale * weight;

        let rotation = if self.rotation.dot(other.rotation) < 0.0 {
            -other.rotation
        } else {
            other.rotation
        };
        self.rotation = self.rotation + rotation * weight;
    }

    /// Normalizes the rotation. A zero rotation becomes identity.
    pub fn normalize_rotation(&mut self) {
        let length = self.rotation.length();
        self.rotation = if length > f32::EPSILON {
            self.rotation / length
        } else {
            Quat::IDENTITY
        };
    }

    /// Interpolates towards `other`: lerp for translation and scale, slerp for
    /// rotation.
    #[must_use]
    pub fn blend(&self, other: &Transform, t: f32) -> Self {
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Relative motion from `self` to `other`, expressed in world axes for
    /// the translation.
    #[must_use]
    pub fn delta_to(&self, other: &Transform) -> Self {
        Self {
            translation: other.translation - self.translation,
            rotation: (self.rotation.inverse() * other.rotation).normalize(),
            scale: Vec3::ONE,
        }
    }

    /// Chains two deltas produced by [`Transform::delta_to`].
    #[must_use]
    pub fn accumulate(&self, next: &Transform) -> Self {
        Self {
            translation: self.translation + next.translation,
            rotation: (self.rotation * next.rotation).normalize(),
            scale: self.scale * next.scale,
        }
    }

    /// Rotation around the vertical (Z) axis in radians, measured from +Y.
    #[must_use]
    pub fn heading(&self) -> f32 {
        let forward = self.rotation * Vec3::Y;
        forward.x.atan2(forward.y)
    }
}
