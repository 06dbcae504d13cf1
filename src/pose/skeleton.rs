use thiserror::Error;

use super::transform::Transform;

/// A single joint of a [`Skeleton`].
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    /// Parent joint index; parents always precede their children.
    pub parent: Option<usize>,
}

impl Joint {
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SkeletonError {
    #[error("bind pose has {transforms} transforms for {joints} joints")]
    BindPoseMismatch { joints: usize, transforms: usize },
    #[error("joint {joint} references parent {parent} which does not precede it")]
    InvalidParent { joint: usize, parent: usize },
    #[error("motion extraction joint {0} is out of range")]
    InvalidMotionExtractionJoint(usize),
}

/// Joint hierarchy plus bind pose of an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    joints: Vec<Joint>,
    bind_pose: Vec<Transform>,
    motion_extraction_joint: Option<usize>,
}

impl Skeleton {
    pub fn new(joints: Vec<Joint>, bind_pose: Vec<Transform>) -> Result<Self, SkeletonError> {
        if joints.len() != bind_pose.len() {
            return Err(SkeletonError::BindPoseMismatch {
                joints: joints.len(),
                transforms: bind_pose.len(),
            });
        }

        for (index, joint) in joints.iter().enumerate() {
            if let Some(parent) = joint.parent {
                if parent >= index {
                    return Err(SkeletonError::InvalidParent {
                        joint: index,
                        parent,
                    });
                }
            }
        }

        Ok(Self {
            joints,
            bind_pose,
            motion_extraction_joint: None,
        })
    }

    /// Straight chain of `count` joints with identity bind transforms. The
    /// first joint is the motion extraction joint.
    #[must_use]
    pub fn chain(count: usize) -> Self {
        let joints = (0..count)
            .map(|i| Joint::new(format!("joint_{i}"), i.checked_sub(1)))
            .collect();
        Self {
            joints,
            bind_pose: vec![Transform::IDENTITY; count],
            motion_extraction_joint: (count > 0).then_some(0),
        }
    }

    pub fn with_motion_extraction_joint(mut self, joint: usize) -> Result<Self, SkeletonError> {
        if joint >= self.joints.len() {
            return Err(SkeletonError::InvalidMotionExtractionJoint(joint));
        }
        self.motion_extraction_joint = Some(joint);
        Ok(self)
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[must_use]
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|joint| joint.name == name)
    }

    #[must_use]
    pub fn bind_pose(&self) -> &[Transform] {
        &self.bind_pose
    }

    #[must_use]
    pub fn motion_extraction_joint(&self) -> Option<usize> {
        self.motion_extraction_joint
    }
}
