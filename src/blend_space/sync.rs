//! Playback and synchronization of the motions of a blend space.
//!
//! With sync enabled the leader motion advances at a speed that makes one
//! cycle last the weighted average duration of the active motions. All
//! other motions, also those without weight, follow the leader either by
//! normalized clip time or by matching sync-track segments, so a motion
//! that starts contributing is already in phase.

use super::config::SyncMode;
use super::locate::BlendInfo;
use super::motion_info::MotionInfo;
use crate::motion::MotionInstance;

const DURATION_EPSILON: f32 = 1e-5;

/// Picks the motion that drives synchronization: the configured leader if it
/// resolved, otherwise the first resolved motion.
#[must_use]
pub fn select_leader(leader_id: Option<&str>, infos: &[MotionInfo]) -> Option<usize> {
    leader_id
        .and_then(|id| infos.iter().position(|info| info.motion_id == id))
        .or_else(|| (!infos.is_empty()).then_some(0))
}

/// Highest weighted motion; the first one wins on equal weight.
#[must_use]
pub fn most_weighted(blend_infos: &[BlendInfo]) -> Option<usize> {
    let mut best: Option<&BlendInfo> = None;
    for info in blend_infos {
        if best.is_none_or(|current| info.weight > current.weight) {
            best = Some(info);
        }
    }
    best.map(|info| info.motion_index)
}

/// Weighted average duration of the active motions.
#[must_use]
pub fn blended_duration(infos: &[MotionInfo], blend_infos: &[BlendInfo]) -> f32 {
    let (sum, total_weight) = blend_infos
        .iter()
        .filter_map(|bi| infos.get(bi.motion_index).map(|info| (info.duration(), bi.weight)))
        .fold((0.0, 0.0), |(sum, total), (duration, weight)| {
            (sum + duration * weight, total + weight)
        });
    if total_weight > 0.0 { sum / total_weight } else { 0.0 }
}

/// Advances playback for one frame. Every resolved motion keeps running,
/// also at zero weight. With sync the followers are placed afterwards by
/// [`synchronize_followers`].
pub fn advance_motions(
    infos: &mut [MotionInfo],
    blend_infos: &[BlendInfo],
    sync_mode: SyncMode,
    leader: Option<usize>,
    time_passed: f32,
) {
    let leader = leader.filter(|_| sync_mode != SyncMode::Disabled);
    let Some(leader) = leader else {
        for info in infos.iter_mut() {
            info.instance.set_play_speed(info.base_play_speed);
            info.instance.update(time_passed);
        }
        return;
    };

    let mut cycle = blended_duration(infos, blend_infos);
    if cycle <= DURATION_EPSILON {
        cycle = infos.get(leader).map_or(0.0, MotionInfo::duration);
    }

    for (index, info) in infos.iter_mut().enumerate() {
        let factor = if cycle > DURATION_EPSILON {
            info.duration() / cycle
        } else {
            1.0
        };
        info.instance.set_play_speed(info.base_play_speed * factor);

        if index == leader {
            info.instance.update(time_passed);
        } else {
            // Followers are placed by `synchronize_followers`.
            info.instance.update(0.0);
        }
    }
}

/// Aligns every motion other than the leader with it, whatever its weight.
pub fn synchronize_followers(
    infos: &mut [MotionInfo],
    sync_mode: SyncMode,
    leader: Option<usize>,
) {
    if sync_mode == SyncMode::Disabled {
        return;
    }
    let Some(leader_index) = leader else {
        return;
    };
    let Some(leader_info) = infos.get_mut(leader_index) else {
        return;
    };

    let previous_index = leader_info.instance.sync_index();
    let current_index = leader_info
        .instance
        .motion()
        .sync_track()
        .find_event_indices(leader_info.instance.current_time())
        .map(|(first, _)| first);
    leader_info.instance.set_sync_index(current_index);
    let leader_changed_segment = previous_index != current_index;
    let leader_state: MotionInstance = (*leader_info.instance).clone();

    for (index, follower) in infos.iter_mut().enumerate() {
        if index == leader_index {
            continue;
        }
        let synced = sync_mode == SyncMode::TrackBased
            && sync_using_sync_tracks(&leader_state, &mut follower.instance, leader_changed_segment);
        if !synced {
            sync_play_time(&leader_state, &mut follower.instance);
        }
    }
}

/// Gives the follower the same normalized time as the leader.
pub fn sync_play_time(leader: &MotionInstance, follower: &mut MotionInstance) {
    follower.set_normalized_time(leader.normalized_time());
}

/// Places the follower at the same relative position inside the matching
/// sync-track segment. Returns `false` when the tracks cannot be matched.
pub fn sync_using_sync_tracks(
    leader: &MotionInstance,
    follower: &mut MotionInstance,
    leader_changed_segment: bool,
) -> bool {
    let leader_motion = leader.motion();
    let follower_motion = follower.motion().clone();
    let track_a = leader_motion.sync_track();
    let track_b = follower_motion.sync_track();
    if track_a.is_empty() || track_b.is_empty() {
        return false;
    }

    let forward = leader.play_speed() >= 0.0;
    let leader_time = leader.current_time();
    let Some((a1, a2)) = track_a.find_event_indices(leader_time) else {
        return false;
    };
    let (Some(id_a1), Some(id_a2)) = (track_a.event_id(a1), track_a.event_id(a2)) else {
        return false;
    };

    let matched = match follower.sync_index() {
        None => {
            let occurrence = track_a.calc_occurrence(a1, a2);
            track_b.extract_occurrence(occurrence, id_a1, id_a2)
        }
        Some(current) => {
            let count = track_b.event_count();
            let start = if !leader_changed_segment {
                current
            } else if forward {
                (current + 1) % count
            } else {
                (current + count - 1) % count
            };
            track_b.find_matching_events(start, id_a1, id_a2, forward)
        }
    };
    let Some((b1, b2)) = matched else {
        return false;
    };
    follower.set_sync_index(Some(b1));

    let segment_a = track_a.calc_segment_length(a1, a2);
    let segment_b = track_b.calc_segment_length(b1, b2);
    let (Some(time_a1), Some(time_b1)) = (track_a.event_time(a1), track_b.event_time(b1)) else {
        return false;
    };

    let mut offset = leader_time - time_a1;
    if offset < 0.0 {
        offset += leader.duration();
    }
    let fraction = if segment_a > DURATION_EPSILON {
        offset / segment_a
    } else {
        0.0
    };

    let duration_b = follower.duration();
    let new_time = if duration_b > DURATION_EPSILON {
        (time_b1 + segment_b * fraction).rem_euclid(duration_b)
    } else {
        0.0
    };
    follower.set_current_time(new_time);
    if segment_a > DURATION_EPSILON {
        follower.set_play_speed(leader.play_speed() * segment_b / segment_a);
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec2;

    use super::*;
    use crate::motion::{KeyframedMotion, Motion, MotionInstancePool, SyncEvent};

    fn info(pool: &Arc<MotionInstancePool>, motion: KeyframedMotion) -> MotionInfo {
        let motion: Arc<dyn Motion> = Arc::new(motion);
        MotionInfo {
            config_index: 0,
            motion_id: motion.id().to_owned(),
            position: Vec2::ZERO,
            instance: pool.request(motion),
            base_play_speed: 1.0,
        }
    }

    fn blend(weights: &[f32]) -> Vec<BlendInfo> {
        weights
            .iter()
            .enumerate()
            .map(|(motion_index, &weight)| BlendInfo {
                motion_index,
                weight,
            })
            .collect()
    }

    #[test]
    fn leader_defaults_to_first_motion() {
        let pool = MotionInstancePool::new();
        let infos = vec![
            info(&pool, KeyframedMotion::new("walk", 1.0)),
            info(&pool, KeyframedMotion::new("run", 0.5)),
        ];
        assert_eq!(select_leader(None, &infos), Some(0));
        assert_eq!(select_leader(Some("run"), &infos), Some(1));
        assert_eq!(select_leader(Some("idle"), &infos), Some(0));
        assert_eq!(select_leader(None, &[]), None);
    }

    #[test]
    fn clip_sync_keeps_phases_equal() {
        let pool = MotionInstancePool::new();
        let mut infos = vec![
            info(&pool, KeyframedMotion::new("walk", 1.0)),
            info(&pool, KeyframedMotion::new("run", 0.5)),
        ];
        let weights = blend(&[0.5, 0.5]);

        for _ in 0..25 {
            let leader = select_leader(None, &infos);
            advance_motions(&mut infos, &weights, SyncMode::ClipBased, leader, 1.0 / 30.0);
            synchronize_followers(&mut infos, SyncMode::ClipBased, leader);
            let phase_a = infos[0].instance.normalized_time();
            let phase_b = infos[1].instance.normalized_time();
            assert!((phase_a - phase_b).abs() < 1e-4, "{phase_a} vs {phase_b}");
        }
    }

    #[test]
    fn weightless_motions_stay_in_phase() {
        let pool = MotionInstancePool::new();
        let mut infos = vec![
            info(&pool, KeyframedMotion::new("idle", 2.0)),
            info(&pool, KeyframedMotion::new("walk", 1.0)),
            info(&pool, KeyframedMotion::new("run", 0.3)),
        ];
        // Only idle and walk contribute; run has no weight.
        let weights = blend(&[0.6, 0.4]);

        for _ in 0..13 {
            let leader = select_leader(None, &infos);
            advance_motions(&mut infos, &weights, SyncMode::ClipBased, leader, 1.0 / 30.0);
            synchronize_followers(&mut infos, SyncMode::ClipBased, leader);
        }
        let phase = infos[0].instance.normalized_time();
        assert!(phase > 0.0);
        for follower in &infos[1..] {
            assert!((follower.instance.normalized_time() - phase).abs() < 1e-4);
        }
    }

    #[test]
    fn synced_cycle_uses_blended_duration() {
        let pool = MotionInstancePool::new();
        let mut infos = vec![
            info(&pool, KeyframedMotion::new("walk", 1.0)),
            info(&pool, KeyframedMotion::new("run", 0.5)),
        ];
        let weights = blend(&[0.5, 0.5]);
        assert!((blended_duration(&infos, &weights) - 0.75).abs() < 1e-6);

        advance_motions(&mut infos, &weights, SyncMode::ClipBased, Some(0), 0.375);
        assert!((infos[0].instance.normalized_time() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn unsynced_motions_run_at_their_own_speed() {
        let pool = MotionInstancePool::new();
        let mut infos = vec![
            info(&pool, KeyframedMotion::new("walk", 1.0)),
            info(&pool, KeyframedMotion::new("run", 0.5)),
            info(&pool, KeyframedMotion::new("idle", 2.0)),
        ];
        let weights = blend(&[0.5, 0.5]);
        advance_motions(&mut infos, &weights, SyncMode::Disabled, Some(0), 0.2);

        assert!((infos[0].instance.current_time() - 0.2).abs() < 1e-6);
        assert!((infos[1].instance.current_time() - 0.2).abs() < 1e-6);
        assert!((infos[2].instance.current_time() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn track_sync_matches_segments() {
        let pool = MotionInstancePool::new();
        let walk = KeyframedMotion::new("walk", 1.0).with_sync_events(vec![
            SyncEvent::new(0.0, "left"),
            SyncEvent::new(0.5, "right"),
        ]);
        let run = KeyframedMotion::new("run", 0.8).with_sync_events(vec![
            SyncEvent::new(0.1, "left"),
            SyncEvent::new(0.3, "right"),
        ]);
        let mut infos = vec![info(&pool, walk), info(&pool, run)];

        infos[0].instance.set_current_time(0.25);
        synchronize_followers(&mut infos, SyncMode::TrackBased, Some(0));

        // Halfway through left->right (0.1..0.3) in the follower.
        assert_eq!(infos[1].instance.sync_index(), Some(0));
        assert!((infos[1].instance.current_time() - 0.2).abs() < 1e-5);

        infos[0].instance.set_current_time(0.75);
        synchronize_followers(&mut infos, SyncMode::TrackBased, Some(0));

        // Halfway through right->left, which wraps: 0.3..(0.8 + 0.1).
        assert_eq!(infos[1].instance.sync_index(), Some(1));
        assert!((infos[1].instance.current_time() - 0.6).abs() < 1e-5);
    }

    #[test]
    fn track_sync_falls_back_to_clip_without_events() {
        let pool = MotionInstancePool::new();
        let walk = KeyframedMotion::new("walk", 1.0)
            .with_sync_events(vec![SyncEvent::new(0.0, "left"), SyncEvent::new(0.5, "right")]);
        let mut infos = vec![info(&pool, walk), info(&pool, KeyframedMotion::new("run", 0.5))];

        infos[0].instance.set_current_time(0.4);
        synchronize_followers(&mut infos, SyncMode::TrackBased, Some(0));
        assert!((infos[1].instance.normalized_time() - 0.4).abs() < 1e-5);
    }
}
