//! Skeletal poses and the pool that recycles them between frames.

mod pool;
#[allow(clippy::module_inception)]
mod pose;
mod skeleton;
mod transform;

pub use pool::{PooledPose, PosePool};
pub use pose::{MotionExtractionFlags, Pose};
pub use skeleton::{Joint, Skeleton, SkeletonError};
pub use transform::Transform;
