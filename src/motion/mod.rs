//! Motions, their playback instances and the sets that resolve them by id.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

mod event;
mod instance;
mod keyframed;
mod sync_track;

pub use event::{EmittedEvent, EventBuffer, MotionEvent};
pub use instance::{MotionInstance, MotionInstancePool, PooledMotionInstance};
pub use keyframed::{Channel, JointTrack, KeyframedMotion};
pub use sync_track::{SyncEvent, SyncTrack};

use crate::pose::{Pose, Skeleton, Transform};

/// Immutable animation data shared between all instances that play it.
pub trait Motion: fmt::Debug + Send + Sync {
    fn id(&self) -> &str;

    /// Length in seconds.
    fn duration(&self) -> f32;

    fn sync_track(&self) -> &SyncTrack;

    /// Events sorted by time.
    fn events(&self) -> &[MotionEvent];

    /// Writes the local pose at `time` into `out`.
    fn sample_pose(&self, time: f32, skeleton: &Skeleton, out: &mut Pose);

    /// Transform of the trajectory (motion extraction) joint at `time`.
    fn root_transform(&self, time: f32) -> Transform;
}

/// Resolves motion ids to motions.
pub trait MotionSet: fmt::Debug + Send + Sync {
    fn find(&self, motion_id: &str) -> Option<Arc<dyn Motion>>;

    fn motion_ids(&self) -> Vec<String>;

    /// Closest known id for an unresolved one, if any is reasonably close.
    fn suggest(&self, motion_id: &str) -> Option<String> {
        let needle = motion_id.to_lowercase();
        self.motion_ids()
            .into_iter()
            .map(|candidate| {
                let distance = levenshtein::levenshtein(&needle, &candidate.to_lowercase());
                (distance, candidate)
            })
            .filter(|(distance, candidate)| *distance <= candidate.len().max(needle.len()) / 2)
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, candidate)| candidate)
    }
}

/// Motion set backed by a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMotionSet {
    motions: BTreeMap<String, Arc<dyn Motion>>,
}

impl InMemoryMotionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a motion under its own id, replacing any previous one.
    pub fn insert(&mut self, motion: Arc<dyn Motion>) {
        self.motions.insert(motion.id().to_owned(), motion);
    }

    #[must_use]
    pub fn with(mut self, motion: impl Motion + 'static) -> Self {
        self.insert(Arc::new(motion));
        self
    }

    pub fn remove(&mut self, motion_id: &str) -> Option<Arc<dyn Motion>> {
        self.motions.remove(motion_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.motions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }
}

impl MotionSet for InMemoryMotionSet {
    fn find(&self, motion_id: &str) -> Option<Arc<dyn Motion>> {
        self.motions.get(motion_id).cloned()
    }

    fn motion_ids(&self) -> Vec<String> {
        self.motions.keys().cloned().collect()
    }
}
