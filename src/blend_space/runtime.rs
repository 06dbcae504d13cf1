//! Per-frame lifecycle shared by 1D and 2D blend spaces.

use glam::Vec2;

use super::config::{ConfigIssue, EventFilterMode, SyncMode};
use super::motion_info::resolve_motion_infos;
use super::sync::{advance_motions, most_weighted, select_leader, synchronize_followers};
use super::unique_data::{BlendSpaceUniqueData, NodeState};
use super::BlendSpace;
use crate::debug_log;
use crate::graph::instance::{AnimGraphContext, AnimGraphInstance};
use crate::motion::EmittedEvent;
use crate::pose::{MotionExtractionFlags, Pose, Transform};

/// Resolves motions and rebuilds geometry when the node configuration or
/// the motion set changed since the last build.
fn ensure_built<B: BlendSpace + ?Sized>(
    node: &B,
    instance: &AnimGraphInstance,
    data: &mut BlendSpaceUniqueData,
    ctx: &AnimGraphContext,
) {
    let revision = node.revision();
    let motion_set_revision = instance.motion_set_revision();
    if data.is_built_for(revision, motion_set_revision) {
        return;
    }

    data.reset();
    let settings = node.settings();
    let (infos, mut issues) =
        resolve_motion_infos(&settings.motions, instance.motion_set(), ctx.motion_pool());
    data.motion_infos = infos;
    issues.extend(node.axis_issues(ctx.manager()));
    if let Some(leader) = &settings.sync_leader {
        if !settings.motions.iter().any(|m| &m.motion_id == leader) {
            issues.push(ConfigIssue::UnknownSyncLeader(leader.clone()));
        }
    }
    for issue in &issues {
        log::warn!("blend space '{}': {issue}", node.name());
    }
    data.issues = issues;

    node.build_geometry(data, ctx.manager());
    for warning in &data.diagnostics.warnings {
        log::warn!("blend space '{}': {warning}", node.name());
    }

    data.built_revision = Some(revision);
    data.built_motion_set_revision = Some(motion_set_revision);
    data.state = NodeState::MotionsResolved;
    debug_log!(
        "blend space '{}' built: {} motions, {} triangles",
        node.name(),
        data.motion_infos.len(),
        data.diagnostics.triangle_count
    );
}

pub(crate) fn init<B: BlendSpace + ?Sized>(
    node: &B,
    instance: &mut AnimGraphInstance,
    ctx: &AnimGraphContext,
) {
    let mut data = instance.take_unique_data(node.id());
    ensure_built(node, instance, &mut data, ctx);
    instance.put_unique_data(node.id(), data);
}

pub(crate) fn update<B: BlendSpace + ?Sized>(
    node: &B,
    instance: &mut AnimGraphInstance,
    ctx: &AnimGraphContext,
    time_passed: f32,
) {
    let mut data = instance.take_unique_data(node.id());
    ensure_built(node, instance, &mut data, ctx);

    let settings = node.settings();
    if settings.disabled {
        data.blend_infos.clear();
        data.leader = None;
    } else {
        let query = node.query_position(instance, &data);
        data.current_position = query;
        data.location = node.locate(&data, query);
        data.blend_infos = data.location.blend_infos();
        data.state = NodeState::Located;

        data.leader = select_leader(settings.sync_leader.as_deref(), &data.motion_infos);
        advance_motions(
            &mut data.motion_infos,
            &data.blend_infos,
            settings.sync_mode,
            data.leader,
            time_passed,
        );
    }

    instance.put_unique_data(node.id(), data);
}

pub(crate) fn top_down_update<B: BlendSpace + ?Sized>(
    node: &B,
    instance: &mut AnimGraphInstance,
) {
    let mut data = instance.take_unique_data(node.id());
    let settings = node.settings();
    if !settings.disabled && data.state == NodeState::Located {
        synchronize_followers(&mut data.motion_infos, settings.sync_mode, data.leader);
    }
    instance.put_unique_data(node.id(), data);
}

/// Collects events and the trajectory delta. The trajectory comes from the
/// sync leader when syncing, otherwise from the most weighted motion. The
/// most-active event filter always picks the most weighted motion.
pub(crate) fn post_update<B: BlendSpace + ?Sized>(node: &B, instance: &mut AnimGraphInstance) {
    let mut data = instance.take_unique_data(node.id());
    data.events.clear();
    data.trajectory_delta = Transform::IDENTITY;

    let settings = node.settings();
    if !settings.disabled && !data.blend_infos.is_empty() {
        let most_active = most_weighted(&data.blend_infos);
        let source = if settings.sync_mode == SyncMode::Disabled {
            most_active
        } else {
            data.leader
        };

        if let Some(info) = source.and_then(|index| data.motion_infos.get(index)) {
            data.trajectory_delta = info.instance.trajectory_delta();
        }

        let emitters: Vec<(usize, f32)> = match settings.event_filter_mode {
            EventFilterMode::AllActiveMotions => data
                .blend_infos
                .iter()
                .map(|bi| (bi.motion_index, bi.weight))
                .collect(),
            EventFilterMode::MostActiveMotion => most_active
                .map(|index| {
                    let weight = data
                        .blend_infos
                        .iter()
                        .find(|bi| bi.motion_index == index)
                        .map_or(0.0, |bi| bi.weight);
                    vec![(index, weight)]
                })
                .unwrap_or_default(),
            EventFilterMode::None => Vec::new(),
        };

        for (index, weight) in emitters {
            let Some(info) = data.motion_infos.get(index) else {
                continue;
            };
            for event in info.instance.extract_events() {
                data.events.push(EmittedEvent {
                    name: event.name,
                    time: event.time,
                    motion_id: info.motion_id.clone(),
                    weight,
                });
            }
        }
    }

    instance.put_unique_data(node.id(), data);
}

/// Weighted sum of the sampled motion poses, or the bind pose when the node
/// is disabled or nothing contributes.
pub(crate) fn output<B: BlendSpace + ?Sized>(
    node: &B,
    instance: &AnimGraphInstance,
    ctx: &AnimGraphContext,
    out: &mut Pose,
) {
    let skeleton = instance.skeleton();
    out.init_from_bind_pose(skeleton);

    let settings = node.settings();
    let Some(data) = instance.unique_data(node.id()) else {
        return;
    };
    if settings.disabled || data.blend_infos.is_empty() {
        return;
    }

    out.zero();
    for bi in &data.blend_infos {
        let Some(info) = data.motion_infos.get(bi.motion_index) else {
            continue;
        };
        let mut sampled = ctx.pose_pool().request(skeleton);
        info.instance.sample_into(skeleton, &mut sampled);
        if settings.in_place {
            sampled.compensate_for_motion_extraction(skeleton, MotionExtractionFlags::default());
        }
        out.sum(&sampled, bi.weight);
    }
    out.normalize_quaternions();
}

pub(crate) fn rewind<B: BlendSpace + ?Sized>(node: &B, instance: &mut AnimGraphInstance) {
    let mut data = instance.take_unique_data(node.id());
    for info in &mut data.motion_infos {
        info.instance.rewind();
    }
    data.events.clear();
    data.trajectory_delta = Transform::IDENTITY;
    instance.put_unique_data(node.id(), data);
}

pub(crate) fn set_current_position<B: BlendSpace + ?Sized>(
    node: &B,
    instance: &mut AnimGraphInstance,
    position: Vec2,
) {
    let mut data = instance.take_unique_data(node.id());
    data.interactive_position = Some(position);
    instance.put_unique_data(node.id(), data);
}
