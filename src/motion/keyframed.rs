use std::cmp::Ordering;

use glam::{Quat, Vec3};

use super::event::MotionEvent;
use super::sync_track::{SyncEvent, SyncTrack};
use super::Motion;
use crate::pose::{Pose, Skeleton, Transform};

/// Keyframes of a single animated property.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel<T> {
    times: Vec<f32>,
    values: Vec<T>,
}

impl<T: Copy> Channel<T> {
    /// Pairs up keys, dropping surplus values or times.
    #[must_use]
    pub fn new(mut times: Vec<f32>, mut values: Vec<T>) -> Self {
        let len = times.len().min(values.len());
        times.truncate(len);
        values.truncate(len);
        Self { times, values }
    }

    #[must_use]
    pub fn constant(value: T) -> Self {
        Self {
            times: vec![0.0],
            values: vec![value],
        }
    }

    fn sample(&self, time: f32, interpolate: impl Fn(T, T, f32) -> T) -> Option<T> {
        let (i0, i1) = bin_search_key_indices(&self.times, time);
        let (v0, v1) = (*self.values.get(i0)?, *self.values.get(i1)?);
        let (t0, t1) = (self.times[i0], self.times[i1]);
        let alpha = if i0 == i1 || (t1 - t0).abs() < f32::EPSILON {
            0.0
        } else {
            (time - t0) / (t1 - t0)
        };
        Some(interpolate(v0, v1, alpha))
    }
}

fn bin_search_key_indices(times: &[f32], value: f32) -> (usize, usize) {
    let n = times.len();
    if n <= 1 {
        return (0, 0);
    }

    match times.binary_search_by(|x| x.partial_cmp(&value).unwrap_or(Ordering::Greater)) {
        Ok(i) => (i, i),
        Err(0) => (0, 0),
        Err(i) if i >= n => (n - 1, n - 1),
        Err(i) => (i - 1, i),
    }
}

/// Animated channels of one joint. Missing channels keep the bind pose.
#[derive(Debug, Clone, PartialEq)]
pub struct JointTrack {
    pub joint: usize,
    pub translation: Option<Channel<Vec3>>,
    pub rotation: Option<Channel<Quat>>,
    pub scale: Option<Channel<Vec3>>,
}

impl JointTrack {
    #[must_use]
    pub fn new(joint: usize) -> Self {
        Self {
            joint,
            translation: None,
            rotation: None,
            scale: None,
        }
    }

    #[must_use]
    pub fn with_translation(mut self, channel: Channel<Vec3>) -> Self {
        self.translation = Some(channel);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, channel: Channel<Quat>) -> Self {
        self.rotation = Some(channel);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, channel: Channel<Vec3>) -> Self {
        self.scale = Some(channel);
        self
    }

    fn sample(&self, time: f32, base: &Transform) -> Transform {
        Transform {
            translation: self
                .translation
                .as_ref()
                .and_then(|c| c.sample(time, Vec3::lerp))
                .unwrap_or(base.translation),
            rotation: self
                .rotation
                .as_ref()
                .and_then(|c| c.sample(time, Quat::slerp))
                .unwrap_or(base.rotation),
            scale: self
                .scale
                .as_ref()
                .and_then(|c| c.sample(time, Vec3::lerp))
                .unwrap_or(base.scale),
        }
    }
}

/// In-memory motion clip sampled with linear keyframe interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframedMotion {
    id: String,
    duration: f32,
    tracks: Vec<JointTrack>,
    root_joint: usize,
    sync_track: SyncTrack,
    events: Vec<MotionEvent>,
}

impl KeyframedMotion {
    #[must_use]
    pub fn new(id: impl Into<String>, duration: f32) -> Self {
        let duration = duration.max(0.0);
        Self {
            id: id.into(),
            duration,
            tracks: Vec::new(),
            root_joint: 0,
            sync_track: SyncTrack::new(Vec::new(), duration),
            events: Vec::new(),
        }
    }

    /// Motion whose root moves with a constant `velocity` (units per second)
    /// while turning at `turn_rate` radians per second around Z.
    #[must_use]
    pub fn locomotion(id: impl Into<String>, duration: f32, velocity: Vec3, turn_rate: f32) -> Self {
        let end = duration.max(0.0);
        let root = JointTrack::new(0)
            .with_translation(Channel::new(vec![0.0, end], vec![Vec3::ZERO, velocity * end]))
            .with_rotation(Channel::new(
                vec![0.0, end * 0.5, end],
                vec![
                    Quat::IDENTITY,
                    Quat::from_rotation_z(turn_rate * end * 0.5),
                    Quat::from_rotation_z(turn_rate * end),
                ],
            ));
        Self::new(id, duration).with_track(root)
    }

    #[must_use]
    pub fn with_track(mut self, track: JointTrack) -> Self {
        self.tracks.retain(|existing| existing.joint != track.joint);
        self.tracks.push(track);
        self
    }

    #[must_use]
    pub fn with_root_joint(mut self, joint: usize) -> Self {
        self.root_joint = joint;
        self
    }

    #[must_use]
    pub fn with_sync_events(mut self, events: Vec<SyncEvent>) -> Self {
        self.sync_track = SyncTrack::new(events, self.duration);
        self
    }

    #[must_use]
    pub fn with_events(mut self, mut events: Vec<MotionEvent>) -> Self {
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.events = events;
        self
    }

    fn track(&self, joint: usize) -> Option<&JointTrack> {
        self.tracks.iter().find(|track| track.joint == joint)
    }
}

impl Motion for KeyframedMotion {
    fn id(&self) -> &str {
        &self.id
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn sync_track(&self) -> &SyncTrack {
        &self.sync_track
    }

    fn events(&self) -> &[MotionEvent] {
        &self.events
    }

    fn sample_pose(&self, time: f32, skeleton: &Skeleton, out: &mut Pose) {
        out.init_from_bind_pose(skeleton);
        for track in &self.tracks {
            if let Some(base) = skeleton.bind_pose().get(track.joint) {
                out.set_transform(track.joint, track.sample(time, base));
            }
        }
    }

    fn root_transform(&self, time: f32) -> Transform {
        self.track(self.root_joint)
            .map(|track| track.sample(time, &Transform::IDENTITY))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_indices_clamp_and_bracket() {
        let times = [0.0, 1.0, 2.0];
        assert_eq!(bin_search_key_indices(&times, -1.0), (0, 0));
        assert_eq!(bin_search_key_indices(&times, 1.0), (1, 1));
        assert_eq!(bin_search_key_indices(&times, 1.5), (1, 2));
        assert_eq!(bin_search_key_indices(&times, 5.0), (2, 2));
    }

    #[test]
    fn samples_linear_root_motion() {
        let motion = KeyframedMotion::locomotion("walk", 2.0, Vec3::new(0.0, 1.5, 0.0), 0.0);
        let root = motion.root_transform(1.0);
        assert!((root.translation - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn untracked_joints_keep_bind_pose() {
        let skeleton = Skeleton::chain(3);
        let motion = KeyframedMotion::locomotion("walk", 1.0, Vec3::Y, 0.0);
        let mut pose = Pose::default();
        motion.sample_pose(0.5, &skeleton, &mut pose);

        assert_eq!(pose.len(), 3);
        assert_eq!(pose.transforms()[2], Transform::IDENTITY);
        assert!((pose.transforms()[0].translation - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-5);
    }
}
