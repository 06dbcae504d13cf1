//! 1D and 2D blend-space nodes.
//!
//! A blend space places motions at positions in a one or two dimensional
//! parameter space. Every frame the node locates a query position among
//! those samples, turns the location into blend weights, advances and
//! synchronizes the motions and writes the weighted pose.
//!
//! Configuration lives in the node and is shared by all graph instances.
//! Everything that changes per instance (resolved motions, geometry,
//! weights) lives in [`BlendSpaceUniqueData`] on the
//! [`AnimGraphInstance`](crate::graph::instance::AnimGraphInstance).

pub mod config;
pub mod evaluator;
pub mod locate;
pub mod manager;
pub mod motion_info;
pub mod one_d;
pub(crate) mod runtime;
pub mod sync;
pub mod two_d;
pub mod unique_data;

use std::fmt;

use glam::Vec2;

pub use config::{
    Axis, AxisConfig, BlendSpaceMotion, BlendSpaceSettings, CalculationMethod, ConfigIssue,
    EventFilterMode, SyncMode, UnknownModeError,
};
pub use evaluator::{BuiltinEvaluator, EvaluatorRegistry, NULL_EVALUATOR, ParamEvaluator};
pub use locate::{BlendInfo, CurrentLocation};
pub use manager::BlendSpaceManager;
pub use motion_info::MotionInfo;
pub use one_d::{BlendSpace1DConfig, BlendSpace1DNode};
pub use two_d::{BlendSpace2DConfig, BlendSpace2DNode};
pub use unique_data::{BlendSpaceUniqueData, NodeState};

use crate::graph::instance::{AnimGraphContext, AnimGraphInstance};
use crate::graph::node::{AnimGraphNode, NodeId};
use crate::motion::MotionSet;
use crate::pose::Pose;

/// What a concrete blend space contributes to the shared lifecycle.
pub trait BlendSpace: fmt::Debug + Send + Sync {
    fn id(&self) -> NodeId;

    fn name(&self) -> &str;

    fn settings(&self) -> &BlendSpaceSettings;

    /// Increases on every configuration change.
    fn revision(&self) -> u64;

    fn dimensions(&self) -> usize;

    /// Evaluator problems of the axes.
    fn axis_issues(&self, manager: &BlendSpaceManager) -> Vec<ConfigIssue>;

    /// Computes automatic positions and the sample geometry for the
    /// resolved motions in `data`.
    fn build_geometry(&self, data: &mut BlendSpaceUniqueData, manager: &BlendSpaceManager);

    /// Query position in blend-space units.
    fn query_position(&self, instance: &AnimGraphInstance, data: &BlendSpaceUniqueData) -> Vec2;

    fn locate(&self, data: &BlendSpaceUniqueData, query: Vec2) -> CurrentLocation;
}

/// Evaluator issue of one axis, if any.
fn axis_issue(axis_config: &AxisConfig, axis: Axis, manager: &BlendSpaceManager) -> Option<ConfigIssue> {
    if axis_config.calculation_method != CalculationMethod::Auto {
        return None;
    }
    let name = axis_config.evaluator.trim();
    match manager.evaluators().get(name) {
        _ if name.is_empty() => Some(ConfigIssue::MissingEvaluator { axis }),
        Some(evaluator) if evaluator.is_null() => Some(ConfigIssue::MissingEvaluator { axis }),
        Some(_) => None,
        None => Some(ConfigIssue::UnknownEvaluator {
            axis,
            name: name.to_owned(),
        }),
    }
}

/// Evaluator that computes positions on this axis. Only automatic axes with
/// a usable evaluator have one.
fn axis_evaluator<'m>(axis_config: &AxisConfig, manager: &'m BlendSpaceManager) -> Option<&'m dyn ParamEvaluator> {
    if axis_config.calculation_method != CalculationMethod::Auto {
        return None;
    }
    manager
        .evaluators()
        .get(&axis_config.evaluator)
        .filter(|evaluator| !evaluator.is_null())
}

/// Reads one query coordinate from a graph parameter. A `Vector2` parameter
/// yields its component for `axis`.
fn parameter_coordinate(instance: &AnimGraphInstance, parameter: Option<&str>, axis: Axis) -> Option<f32> {
    let name = parameter?;
    let value = instance.parameter(name)?;
    let coordinate = value.expect_number().or_else(|_| {
        value.expect_vector2().map(|vector| match axis {
            Axis::X => vector.x,
            Axis::Y => vector.y,
        })
    });
    match coordinate {
        Ok(coordinate) => Some(coordinate),
        Err(err) => {
            log::warn!("parameter '{name}' cannot drive an axis: {err}");
            None
        }
    }
}

/// A blend-space node of either dimensionality.
#[derive(Debug, Clone)]
pub enum BlendSpaceNode {
    OneD(BlendSpace1DNode),
    TwoD(BlendSpace2DNode),
}

impl From<BlendSpace1DNode> for BlendSpaceNode {
    fn from(node: BlendSpace1DNode) -> Self {
        Self::OneD(node)
    }
}

impl From<BlendSpace2DNode> for BlendSpaceNode {
    fn from(node: BlendSpace2DNode) -> Self {
        Self::TwoD(node)
    }
}

impl BlendSpaceNode {
    #[must_use]
    pub fn as_blend_space(&self) -> &dyn BlendSpace {
        match self {
            Self::OneD(node) => node,
            Self::TwoD(node) => node,
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.as_blend_space().dimensions()
    }

    #[must_use]
    pub fn settings(&self) -> &BlendSpaceSettings {
        self.as_blend_space().settings()
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        match self {
            Self::OneD(node) => node.set_id(id),
            Self::TwoD(node) => node.set_id(id),
        }
    }

    /// Mutable access to the shared settings. Instances rebuild on their
    /// next update.
    pub fn settings_mut(&mut self) -> &mut BlendSpaceSettings {
        match self {
            Self::OneD(node) => &mut node.config_mut().settings,
            Self::TwoD(node) => &mut node.config_mut().settings,
        }
    }

    pub fn set_motions(&mut self, motions: Vec<BlendSpaceMotion>) {
        self.settings_mut().motions = motions;
    }

    pub fn set_sync_mode(&mut self, sync_mode: SyncMode) {
        self.settings_mut().sync_mode = sync_mode;
    }

    pub fn set_sync_leader(&mut self, motion_id: Option<&str>) {
        self.settings_mut().sync_leader = motion_id.map(str::to_owned);
    }

    pub fn set_event_filter_mode(&mut self, mode: EventFilterMode) {
        self.settings_mut().event_filter_mode = mode;
    }

    pub fn set_in_place(&mut self, in_place: bool) {
        self.settings_mut().in_place = in_place;
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.settings_mut().disabled = disabled;
    }

    /// Configuration problems of this node. Motion ids are only checked
    /// when a motion set is given.
    #[must_use]
    pub fn validate(&self, motion_set: Option<&dyn MotionSet>, manager: &BlendSpaceManager) -> Vec<ConfigIssue> {
        let node = self.as_blend_space();
        let settings = node.settings();
        let mut issues = node.axis_issues(manager);

        if let Some(motion_set) = motion_set {
            for motion in &settings.motions {
                if motion_set.find(&motion.motion_id).is_none() {
                    issues.push(ConfigIssue::UnresolvedMotion {
                        motion_id: motion.motion_id.clone(),
                        suggestion: motion_set.suggest(&motion.motion_id),
                    });
                }
            }
        }

        if let Some(leader) = &settings.sync_leader {
            if !settings.motions.iter().any(|m| &m.motion_id == leader) {
                issues.push(ConfigIssue::UnknownSyncLeader(leader.clone()));
            }
        }
        issues
    }

    #[must_use]
    pub fn has_config_error(&self, manager: &BlendSpaceManager) -> bool {
        !self.validate(None, manager).is_empty()
    }

    /// Sets the position used when no graph parameter drives the axes.
    pub fn set_current_position(&self, instance: &mut AnimGraphInstance, position: Vec2) {
        runtime::set_current_position(self.as_blend_space(), instance, position);
    }
}

impl AnimGraphNode for BlendSpaceNode {
    fn id(&self) -> NodeId {
        self.as_blend_space().id()
    }

    fn name(&self) -> &str {
        self.as_blend_space().name()
    }

    fn init(&self, instance: &mut AnimGraphInstance, ctx: &AnimGraphContext) {
        runtime::init(self.as_blend_space(), instance, ctx);
    }

    fn update(&self, instance: &mut AnimGraphInstance, ctx: &AnimGraphContext, time_passed: f32) {
        runtime::update(self.as_blend_space(), instance, ctx, time_passed);
    }

    fn top_down_update(&self, instance: &mut AnimGraphInstance, _ctx: &AnimGraphContext) {
        runtime::top_down_update(self.as_blend_space(), instance);
    }

    fn post_update(&self, instance: &mut AnimGraphInstance, _ctx: &AnimGraphContext) {
        runtime::post_update(self.as_blend_space(), instance);
    }

    fn output(&self, instance: &mut AnimGraphInstance, ctx: &AnimGraphContext, out: &mut Pose) {
        runtime::output(self.as_blend_space(), instance, ctx, out);
    }

    fn rewind(&self, instance: &mut AnimGraphInstance) {
        runtime::rewind(self.as_blend_space(), instance);
    }

    fn invalidate_unique_data(&self, instance: &mut AnimGraphInstance) {
        if let Some(mut data) = instance.remove_unique_data(self.id()) {
            data.reset();
            instance.put_unique_data(self.id(), data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{InMemoryMotionSet, KeyframedMotion};

    fn node_1d() -> BlendSpaceNode {
        BlendSpace1DNode::new(
            "speed",
            BlendSpace1DConfig {
                settings: BlendSpaceSettings {
                    motions: vec![
                        BlendSpaceMotion::at_x("idle", 0.0),
                        BlendSpaceMotion::at_x("walk", 5.0),
                    ],
                    ..BlendSpaceSettings::default()
                },
                axis: AxisConfig::manual(Some("speed")),
            },
        )
        .into()
    }

    #[test]
    fn settings_changes_bump_revision() {
        let mut node = node_1d();
        let before = node.as_blend_space().revision();
        node.set_sync_mode(SyncMode::ClipBased);
        assert!(node.as_blend_space().revision() > before);
        assert_eq!(node.settings().sync_mode, SyncMode::ClipBased);
    }

    #[test]
    fn validate_reports_missing_motions_and_leader() {
        let mut node = node_1d();
        node.set_sync_leader(Some("run"));
        let manager = BlendSpaceManager::default();
        let set = InMemoryMotionSet::new().with(KeyframedMotion::new("idle", 1.0));

        let issues = node.validate(Some(&set), &manager);
        assert!(issues.contains(&ConfigIssue::UnknownSyncLeader("run".into())));
        assert!(issues.iter().any(
            |issue| matches!(issue, ConfigIssue::UnresolvedMotion { motion_id, .. } if motion_id == "walk")
        ));
        assert!(node.has_config_error(&manager));
    }

    #[test]
    fn auto_axis_without_evaluator_is_an_issue() {
        let manager = BlendSpaceManager::default();
        let missing = AxisConfig::auto(NULL_EVALUATOR, None);
        assert_eq!(
            axis_issue(&missing, Axis::X, &manager),
            Some(ConfigIssue::MissingEvaluator { axis: Axis::X })
        );

        let unknown = AxisConfig::auto("Jump height", None);
        assert!(matches!(
            axis_issue(&unknown, Axis::Y, &manager),
            Some(ConfigIssue::UnknownEvaluator { axis: Axis::Y, .. })
        ));

        let manual = AxisConfig::manual(None);
        assert_eq!(axis_issue(&manual, Axis::X, &manager), None);
        assert!(axis_evaluator(&AxisConfig::auto("move speed", None), &manager).is_some());
    }

    #[test]
    fn parameters_map_onto_axis_coordinates() {
        let ctx = AnimGraphContext::default();
        let mut instance = ctx.create_instance(
            std::sync::Arc::new(crate::pose::Skeleton::chain(1)),
            std::sync::Arc::new(InMemoryMotionSet::new()),
        );
        instance.set_parameter("speed", 2.5);
        instance.set_parameter("direction", Vec2::new(0.25, -1.0));
        instance.set_parameter("crouch", true);

        assert_eq!(parameter_coordinate(&instance, Some("speed"), Axis::Y), Some(2.5));
        assert_eq!(parameter_coordinate(&instance, Some("direction"), Axis::X), Some(0.25));
        assert_eq!(parameter_coordinate(&instance, Some("direction"), Axis::Y), Some(-1.0));
        assert_eq!(parameter_coordinate(&instance, Some("crouch"), Axis::X), None);
        assert_eq!(parameter_coordinate(&instance, Some("unset"), Axis::X), None);
        assert_eq!(parameter_coordinate(&instance, None, Axis::X), None);
    }
}
