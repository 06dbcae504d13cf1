use glam::{Quat, Vec3};

use super::skeleton::Skeleton;
use super::transform::Transform;

/// Which components of the motion extraction joint are treated as
/// trajectory when making a pose in-place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionExtractionFlags {
    /// Also remove vertical (Z) movement.
    pub capture_z: bool,
}

/// Local-space transforms for every joint of a skeleton.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pose {
    transforms: Vec<Transform>,
}

impl Pose {
    pub const EMPTY: Self = Self {
        transforms: Vec::new(),
    };

    #[must_use]
    pub fn from_bind_pose(skeleton: &Skeleton) -> Self {
        Self {
            transforms: skeleton.bind_pose().to_vec(),
        }
    }

    #[must_use]
    pub fn from_transforms(transforms: Vec<Transform>) -> Self {
        Self { transforms }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    #[must_use]
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    #[must_use]
    pub fn transform(&self, joint: usize) -> Option<&Transform> {
        self.transforms.get(joint)
    }

    pub fn set_transform(&mut self, joint: usize, transform: Transform) {
        if let Some(slot) = self.transforms.get_mut(joint) {
            *slot = transform;
        }
    }

    /// Resets to the bind pose of `skeleton`, resizing if needed.
    pub fn init_from_bind_pose(&mut self, skeleton: &Skeleton) {
        self.transforms.clear();
        self.transforms.extend_from_slice(skeleton.bind_pose());
    }

    /// Sets every transform to the additive zero.
    pub fn zero(&mut self) {
        self.transforms.fill(Transform::ZERO);
    }

    /// Adds `other * weight` joint by joint.
    pub fn sum(&mut self, other: &Pose, weight: f32) {
        for (dst, src) in self.transforms.iter_mut().zip(&other.transforms) {
            dst.add_weighted(src, weight);
        }
    }

    pub fn normalize_quaternions(&mut self) {
        for transform in &mut self.transforms {
            transform.normalize_rotation();
        }
    }

    /// Interpolates towards `other` by `weight`.
    pub fn blend(&mut self, other: &Pose, weight: f32) {
        for (dst, src) in self.transforms.iter_mut().zip(&other.transforms) {
            *dst = dst.blend(src, weight);
        }
    }

    /// Removes the projected trajectory from the motion extraction joint so
    /// the pose plays in place.
    pub fn compensate_for_motion_extraction(
        &mut self,
        skeleton: &Skeleton,
        flags: MotionExtractionFlags,
    ) {
        let Some(joint) = skeleton.motion_extraction_joint() else {
            return;
        };
        let (Some(current), Some(bind)) = (self.transforms.get(joint), skeleton.bind_pose().get(joint))
        else {
            return;
        };

        let trajectory = project_to_ground(current, flags);
        let bind_projected = project_to_ground(bind, flags);

        let mut compensated = *current;
        compensated.rotation = ((bind_projected.rotation.inverse() * trajectory.rotation).inverse()
            * compensated.rotation)
            .normalize();
        compensated.translation -= trajectory.translation - bind_projected.translation;
        self.transforms[joint] = compensated;
    }
}

/// Keeps the heading and the ground-plane position of a transform.
fn project_to_ground(transform: &Transform, flags: MotionExtractionFlags) -> Transform {
    let translation = if flags.capture_z {
        transform.translation
    } else {
        Vec3::new(transform.translation.x, transform.translation.y, 0.0)
    };
    Transform::from_translation_rotation(translation, Quat::from_rotation_z(-transform.heading()))
}
