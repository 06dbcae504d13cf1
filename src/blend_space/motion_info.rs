use std::sync::Arc;

use glam::Vec2;

use super::config::{BlendSpaceMotion, ConfigIssue};
use crate::motion::{MotionInstancePool, MotionSet, PooledMotionInstance};

/// A blend-space motion resolved against the motion set of an instance.
#[derive(Debug)]
pub struct MotionInfo {
    /// Index of the motion in the node configuration.
    pub config_index: usize,
    pub motion_id: String,
    /// Position used for locating; authored or computed by an evaluator.
    pub position: Vec2,
    pub instance: PooledMotionInstance,
    /// Play speed before synchronization adjusts it.
    pub base_play_speed: f32,
}

impl MotionInfo {
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.instance.duration()
    }
}

/// Resolves the configured motions. Unresolvable ids are skipped and
/// reported; the remaining motions keep their configuration order.
pub fn resolve_motion_infos(
    motions: &[BlendSpaceMotion],
    motion_set: &dyn MotionSet,
    pool: &Arc<MotionInstancePool>,
) -> (Vec<MotionInfo>, Vec<ConfigIssue>) {
    let mut infos = Vec::with_capacity(motions.len());
    let mut issues = Vec::new();

    for (config_index, entry) in motions.iter().enumerate() {
        match motion_set.find(&entry.motion_id) {
            Some(motion) => infos.push(MotionInfo {
                config_index,
                motion_id: entry.motion_id.clone(),
                position: entry.position,
                instance: pool.request(motion),
                base_play_speed: 1.0,
            }),
            None => {
                let suggestion = motion_set.suggest(&entry.motion_id);
                log::warn!(
                    "motion '{}' not found in motion set{}",
                    entry.motion_id,
                    suggestion
                        .as_ref()
                        .map(|s| format!(", closest match '{s}'"))
                        .unwrap_or_default()
                );
                issues.push(ConfigIssue::UnresolvedMotion {
                    motion_id: entry.motion_id.clone(),
                    suggestion,
                });
            }
        }
    }

    (infos, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{InMemoryMotionSet, KeyframedMotion};

    #[test]
    fn skips_unresolved_motions() {
        let set = InMemoryMotionSet::new()
            .with(KeyframedMotion::new("walk", 1.0))
            .with(KeyframedMotion::new("run", 0.6));
        let motions = [
            BlendSpaceMotion::at_x("walk", 1.0),
            BlendSpaceMotion::at_x("jog", 2.0),
            BlendSpaceMotion::at_x("run", 3.0),
        ];
        let pool = MotionInstancePool::new();

        let (infos, issues) = resolve_motion_infos(&motions, &set, &pool);

        let ids: Vec<_> = infos.iter().map(|info| info.motion_id.as_str()).collect();
        assert_eq!(ids, ["walk", "run"]);
        assert_eq!(infos[1].config_index, 2);
        assert_eq!(issues.len(), 1);
        assert!(matches!(&issues[0], ConfigIssue::UnresolvedMotion { motion_id, .. } if motion_id == "jog"));
        assert_eq!(pool.live_count(), 2);

        drop(infos);
        assert_eq!(pool.live_count(), 0);
    }
}
