//! Evaluatie van één animatieframe.

use serde::Serialize;

use super::instance::{AnimGraphContext, AnimGraphInstance};
use super::node::AnimGraphNode;
use super::{AnimGraph, GraphError};
use crate::motion::EventBuffer;
use crate::pose::{Pose, Transform};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Resultaat van een frame voor één instantie.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameOutput {
    #[serde(skip)]
    pub pose: Pose,
    pub events: EventBuffer,
    /// Beweging van de root sinds het vorige frame.
    pub trajectory_delta: Transform,
}

/// Evalueert de root-node van de graph voor één instantie: `update`,
/// `top_down_update`, `post_update` en tot slot `output`.
pub fn evaluate_frame(
    graph: &AnimGraph,
    instance: &mut AnimGraphInstance,
    ctx: &AnimGraphContext,
    time_passed: f32,
) -> Result<FrameOutput, GraphError> {
    let root = graph.root_node()?;

    root.update(instance, ctx, time_passed);
    root.top_down_update(instance, ctx);
    root.post_update(instance, ctx);

    let mut pose = Pose::from_bind_pose(instance.skeleton());
    root.output(instance, ctx, &mut pose);

    let (events, trajectory_delta) = instance
        .unique_data(root.id())
        .map(|data| (data.events.clone(), data.trajectory_delta))
        .unwrap_or_default();

    Ok(FrameOutput {
        pose,
        events,
        trajectory_delta,
    })
}

/// Evalueert een frame voor meerdere onafhankelijke instanties.
#[cfg(feature = "parallel")]
pub fn evaluate_frames(
    graph: &AnimGraph,
    instances: &mut [AnimGraphInstance],
    ctx: &AnimGraphContext,
    time_passed: f32,
) -> Result<Vec<FrameOutput>, GraphError> {
    instances
        .par_iter_mut()
        .map(|instance| evaluate_frame(graph, instance, ctx, time_passed))
        .collect()
}

/// Evalueert een frame voor meerdere onafhankelijke instanties.
#[cfg(not(feature = "parallel"))]
pub fn evaluate_frames(
    graph: &AnimGraph,
    instances: &mut [AnimGraphInstance],
    ctx: &AnimGraphContext,
    time_passed: f32,
) -> Result<Vec<FrameOutput>, GraphError> {
    instances
        .iter_mut()
        .map(|instance| evaluate_frame(graph, instance, ctx, time_passed))
        .collect()
}

/// Zet alle nodes van de graph terug naar het begin.
pub fn rewind(graph: &AnimGraph, instance: &mut AnimGraphInstance) {
    for node in graph.nodes() {
        node.rewind(instance);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::blend_space::{AxisConfig, BlendSpace1DConfig, BlendSpace1DNode, BlendSpaceMotion, BlendSpaceSettings};
    use crate::motion::{InMemoryMotionSet, KeyframedMotion, MotionEvent};
    use crate::pose::Skeleton;

    fn graph() -> AnimGraph {
        let mut graph = AnimGraph::new();
        graph
            .add_node(BlendSpace1DNode::new(
                "locomotion",
                BlendSpace1DConfig {
                    settings: BlendSpaceSettings {
                        motions: vec![BlendSpaceMotion::at_x("idle", 0.0), BlendSpaceMotion::at_x("walk", 1.0)],
                        ..BlendSpaceSettings::default()
                    },
                    axis: AxisConfig::manual(Some("speed")),
                },
            ))
            .unwrap();
        graph
    }

    fn motions() -> Arc<InMemoryMotionSet> {
        Arc::new(
            InMemoryMotionSet::new()
                .with(KeyframedMotion::new("idle", 1.0))
                .with(KeyframedMotion::new("walk", 1.0).with_events(vec![MotionEvent::new(0.5, "footstep")])),
        )
    }

    #[test]
    fn empty_graph_has_no_root() {
        let ctx = AnimGraphContext::default();
        let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), motions());
        let err = evaluate_frame(&AnimGraph::new(), &mut instance, &ctx, 0.1).unwrap_err();
        assert_eq!(err, GraphError::NoRootNode);
    }

    #[test]
    fn frame_collects_events_of_active_motions() {
        let graph = graph();
        let ctx = AnimGraphContext::default();
        let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(2)), motions());
        instance.set_parameter("speed", 1.0);

        let first = evaluate_frame(&graph, &mut instance, &ctx, 0.4).unwrap();
        assert!(first.events.is_empty());
        assert_eq!(first.pose.len(), 2);

        let second = evaluate_frame(&graph, &mut instance, &ctx, 0.2).unwrap();
        let names: Vec<_> = second.events.iter().map(|event| event.name.as_str()).collect();
        assert_eq!(names, ["footstep"]);
    }

    #[test]
    fn frames_for_many_instances() {
        let graph = graph();
        let ctx = AnimGraphContext::default();
        let mut instances: Vec<_> = (0..4)
            .map(|_| ctx.create_instance(Arc::new(Skeleton::chain(1)), motions()))
            .collect();

        let outputs = evaluate_frames(&graph, &mut instances, &ctx, 0.1).unwrap();
        assert_eq!(outputs.len(), 4);

        rewind(&graph, &mut instances[0]);
        let data = instances[0].unique_data(graph.nodes()[0].id()).unwrap();
        assert!(data.motion_infos.iter().all(|info| info.instance.current_time() == 0.0));
    }
}
