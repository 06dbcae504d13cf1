use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::event::MotionEvent;
use super::Motion;
use crate::pose::{Pose, Skeleton, Transform};

const TIME_EPSILON: f32 = 1e-5;

/// Playback state of one motion for one graph instance.
#[derive(Debug, Clone)]
pub struct MotionInstance {
    motion: Arc<dyn Motion>,
    current_time: f32,
    last_time: f32,
    play_speed: f32,
    looping: bool,
    has_looped: bool,
    has_ended: bool,
    sync_index: Option<usize>,
}

impl MotionInstance {
    #[must_use]
    pub fn new(motion: Arc<dyn Motion>) -> Self {
        Self {
            motion,
            current_time: 0.0,
            last_time: 0.0,
            play_speed: 1.0,
            looping: true,
            has_looped: false,
            has_ended: false,
            sync_index: None,
        }
    }

    #[must_use]
    pub fn motion(&self) -> &Arc<dyn Motion> {
        &self.motion
    }

    #[must_use]
    pub fn motion_id(&self) -> &str {
        self.motion.id()
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.motion.duration()
    }

    #[must_use]
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    #[must_use]
    pub fn last_time(&self) -> f32 {
        self.last_time
    }

    /// Current time as a fraction of the duration.
    #[must_use]
    pub fn normalized_time(&self) -> f32 {
        let duration = self.duration();
        if duration > TIME_EPSILON {
            self.current_time / duration
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn play_speed(&self) -> f32 {
        self.play_speed
    }

    pub fn set_play_speed(&mut self, speed: f32) {
        self.play_speed = speed;
    }

    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    #[must_use]
    pub fn has_looped(&self) -> bool {
        self.has_looped
    }

    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.has_ended
    }

    #[must_use]
    pub fn sync_index(&self) -> Option<usize> {
        self.sync_index
    }

    pub fn set_sync_index(&mut self, index: Option<usize>) {
        self.sync_index = index;
    }

    /// Advances the playhead by `time_passed * play_speed`.
    pub fn update(&mut self, time_passed: f32) {
        let target = self.current_time + time_passed * self.play_speed;
        self.last_time = self.current_time;
        self.place_playhead(target);
    }

    /// Moves the playhead to `time` as a synchronization step. The previous
    /// time is kept as the last time so events and trajectory cover the jump.
    pub fn set_current_time(&mut self, time: f32) {
        let duration = self.duration();
        self.last_time = self.current_time;
        if duration <= TIME_EPSILON {
            self.current_time = 0.0;
            self.has_looped = false;
            return;
        }

        let wrapped = if self.looping {
            time.rem_euclid(duration)
        } else {
            time.clamp(0.0, duration)
        };
        self.has_looped = self.looping
            && self.play_speed >= 0.0
            && self.last_time - wrapped > duration * 0.5;
        self.has_ended = !self.looping && wrapped >= duration;
        self.current_time = wrapped;
    }

    pub fn set_normalized_time(&mut self, normalized: f32) {
        self.set_current_time(normalized * self.duration());
    }

    fn place_playhead(&mut self, target: f32) {
        let duration = self.duration();
        if duration <= TIME_EPSILON {
            self.current_time = 0.0;
            self.has_looped = false;
            return;
        }

        if self.looping {
            self.has_looped = !(0.0..duration).contains(&target);
            self.current_time = target.rem_euclid(duration);
        } else {
            self.has_looped = false;
            self.has_ended = target >= duration;
            self.current_time = target.clamp(0.0, duration);
        }
    }

    /// Puts the playhead back at the start and forgets the sync segment.
    pub fn rewind(&mut self) {
        self.current_time = 0.0;
        self.last_time = 0.0;
        self.has_looped = false;
        self.has_ended = false;
        self.sync_index = None;
    }

    /// Events passed between the last and the current time.
    #[must_use]
    pub fn extract_events(&self) -> Vec<MotionEvent> {
        let events = self.motion.events();
        if events.is_empty() {
            return Vec::new();
        }

        let in_range = |from: f32, to: f32| {
            events
                .iter()
                .filter(move |event| event.time > from && event.time <= to)
                .cloned()
        };

        if self.has_looped {
            if self.play_speed >= 0.0 {
                in_range(self.last_time, self.duration() + TIME_EPSILON)
                    .chain(in_range(-TIME_EPSILON, self.current_time))
                    .collect()
            } else {
                in_range(-TIME_EPSILON, self.last_time)
                    .chain(in_range(self.current_time, self.duration() + TIME_EPSILON))
                    .collect()
            }
        } else if (self.current_time - self.last_time).abs() < TIME_EPSILON {
            Vec::new()
        } else {
            let (from, to) = if self.current_time >= self.last_time {
                (self.last_time, self.current_time)
            } else {
                (self.current_time, self.last_time)
            };
            in_range(from, to).collect()
        }
    }

    /// Root movement between the last and the current time.
    #[must_use]
    pub fn trajectory_delta(&self) -> Transform {
        let root = |time: f32| self.motion.root_transform(time);
        if self.has_looped && self.play_speed >= 0.0 {
            root(self.last_time)
                .delta_to(&root(self.duration()))
                .accumulate(&root(0.0).delta_to(&root(self.current_time)))
        } else if self.has_looped {
            root(self.last_time)
                .delta_to(&root(0.0))
                .accumulate(&root(self.duration()).delta_to(&root(self.current_time)))
        } else {
            root(self.last_time).delta_to(&root(self.current_time))
        }
    }

    /// Samples the motion at the current time into `out`.
    pub fn sample_into(&self, skeleton: &Skeleton, out: &mut Pose) {
        self.motion.sample_pose(self.current_time, skeleton, out);
    }
}

/// Thread-safe factory for [`MotionInstance`]s that tracks how many are
/// alive.
#[derive(Debug, Default)]
pub struct MotionInstancePool {
    live: AtomicUsize,
    created: AtomicUsize,
}

impl MotionInstancePool {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn request(self: &Arc<Self>, motion: Arc<dyn Motion>) -> PooledMotionInstance {
        self.live.fetch_add(1, Ordering::AcqRel);
        self.created.fetch_add(1, Ordering::Relaxed);
        PooledMotionInstance {
            pool: Arc::clone(self),
            instance: MotionInstance::new(motion),
        }
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

/// Motion instance owned by a pool; returned to it on drop.
#[derive(Debug)]
pub struct PooledMotionInstance {
    pool: Arc<MotionInstancePool>,
    instance: MotionInstance,
}

impl Deref for PooledMotionInstance {
    type Target = MotionInstance;

    fn deref(&self) -> &MotionInstance {
        &self.instance
    }
}

impl DerefMut for PooledMotionInstance {
    fn deref_mut(&mut self) -> &mut MotionInstance {
        &mut self.instance
    }
}

impl Drop for PooledMotionInstance {
    fn drop(&mut self) {
        self.pool.live.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::motion::KeyframedMotion;

    fn clip(duration: f32) -> Arc<dyn Motion> {
        Arc::new(
            KeyframedMotion::locomotion("walk", duration, Vec3::new(0.0, 2.0, 0.0), 0.0).with_events(vec![
                MotionEvent::new(0.25, "left"),
                MotionEvent::new(0.75, "right"),
            ]),
        )
    }

    #[test]
    fn update_wraps_looping_motion() {
        let mut instance = MotionInstance::new(clip(1.0));
        instance.update(0.6);
        assert!(!instance.has_looped());
        instance.update(0.6);
        assert!(instance.has_looped());
        assert!((instance.current_time() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn non_looping_motion_clamps_at_end() {
        let mut instance = MotionInstance::new(clip(1.0));
        instance.set_looping(false);
        instance.update(3.0);
        assert!(instance.has_ended());
        assert!((instance.current_time() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn events_are_extracted_across_the_loop() {
        let mut instance = MotionInstance::new(clip(1.0));
        instance.update(0.5);
        let names: Vec<_> = instance.extract_events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["left"]);

        instance.update(0.8);
        let names: Vec<_> = instance.extract_events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["right", "left"]);
    }

    #[test]
    fn trajectory_delta_spans_the_loop() {
        let mut instance = MotionInstance::new(clip(1.0));
        instance.update(0.9);
        instance.update(0.2);
        let delta = instance.trajectory_delta();
        assert!((delta.translation.y - 0.4).abs() < 1e-4);
    }

    #[test]
    fn rewind_resets_playhead_and_sync() {
        let mut instance = MotionInstance::new(clip(1.0));
        instance.update(0.4);
        instance.set_sync_index(Some(1));
        instance.rewind();
        assert_eq!(instance.current_time(), 0.0);
        assert_eq!(instance.sync_index(), None);
    }

    #[test]
    fn pool_counts_live_instances() {
        let pool = MotionInstancePool::new();
        let a = pool.request(clip(1.0));
        let b = pool.request(clip(2.0));
        assert_eq!(pool.live_count(), 2);
        drop(a);
        assert_eq!(pool.live_count(), 1);
        drop(b);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.created_count(), 2);
    }
}
