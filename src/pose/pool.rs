use std::ops::{Deref, DerefMut};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::pose::Pose;
use super::skeleton::Skeleton;

/// Recycles pose buffers between frames.
///
/// Poses are handed out as [`PooledPose`] guards which return the buffer on
/// drop, so every request is matched by exactly one release.
#[derive(Debug, Default)]
pub struct PosePool {
    free: Mutex<Vec<Pose>>,
    live: AtomicUsize,
    allocated: AtomicUsize,
}

impl PosePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a pose initialized to the bind pose of `skeleton`.
    pub fn request(&self, skeleton: &Skeleton) -> PooledPose<'_> {
        let recycled = self.free.lock().ok().and_then(|mut free| free.pop());
        let pose = match recycled {
            Some(mut pose) => {
                pose.init_from_bind_pose(skeleton);
                pose
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Pose::from_bind_pose(skeleton)
            }
        };
        self.live.fetch_add(1, Ordering::AcqRel);
        PooledPose {
            pool: self,
            pose: Some(pose),
        }
    }

    fn release(&self, pose: Pose) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        if let Ok(mut free) = self.free.lock() {
            free.push(pose);
        }
    }

    /// Number of poses currently handed out.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Number of pose buffers ever allocated by this pool.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}

/// Pose borrowed from a [`PosePool`].
#[derive(Debug)]
pub struct PooledPose<'a> {
    pool: &'a PosePool,
    pose: Option<Pose>,
}

impl Deref for PooledPose<'_> {
    type Target = Pose;

    fn deref(&self) -> &Pose {
        self.pose.as_ref().unwrap_or(&EMPTY_POSE)
    }
}

impl DerefMut for PooledPose<'_> {
    fn deref_mut(&mut self) -> &mut Pose {
        self.pose.get_or_insert_with(Pose::default)
    }
}

impl Drop for PooledPose<'_> {
    fn drop(&mut self) {
        if let Some(pose) = self.pose.take() {
            self.pool.release(pose);
        }
    }
}

static EMPTY_POSE: Pose = Pose::EMPTY;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_and_drop_are_balanced() {
        let pool = PosePool::new();
        let skeleton = Skeleton::chain(4);
        {
            let a = pool.request(&skeleton);
            let b = pool.request(&skeleton);
            assert_eq!(a.len(), 4);
            assert_eq!(b.len(), 4);
            assert_eq!(pool.live_count(), 2);
        }
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.allocated_count(), 2);
    }

    #[test]
    fn released_buffers_are_reused() {
        let pool = PosePool::new();
        let skeleton = Skeleton::chain(2);
        for _ in 0..10 {
            let mut pose = pool.request(&skeleton);
            pose.zero();
        }
        assert_eq!(pool.allocated_count(), 1);
        assert_eq!(pool.live_count(), 0);

        let pose = pool.request(&skeleton);
        assert_eq!(pose.transforms(), skeleton.bind_pose());
    }
}
