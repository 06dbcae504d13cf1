use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::config::{Axis, AxisConfig, BlendSpaceSettings, CalculationMethod, ConfigIssue};
use super::evaluator::ParamEvaluator;
use super::locate::{CurrentLocation, Geometry2D, locate_2d, principal_axis_chain};
use super::manager::BlendSpaceManager;
use super::unique_data::BlendSpaceUniqueData;
use super::{BlendSpace, axis_evaluator, axis_issue, parameter_coordinate};
use crate::geom::{GeometryDiagnostics, Normalization, outer_edges, triangulate_with_report};
use crate::graph::instance::AnimGraphInstance;
use crate::graph::node::NodeId;
use crate::graph::value::Value;

/// Configuration of a 2D blend space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlendSpace2DConfig {
    pub settings: BlendSpaceSettings,
    pub axis_x: AxisConfig,
    pub axis_y: AxisConfig,
}

/// Blends motions placed in a plane. The samples are triangulated in
/// normalized space; queries inside a triangle blend its three corners,
/// queries outside blend the two ends of the nearest outer edge.
#[derive(Debug, Clone)]
pub struct BlendSpace2DNode {
    id: NodeId,
    name: String,
    config: BlendSpace2DConfig,
    revision: u64,
}

impl BlendSpace2DNode {
    #[must_use]
    pub fn new(name: impl Into<String>, config: BlendSpace2DConfig) -> Self {
        Self {
            id: NodeId::default(),
            name: name.into(),
            config,
            revision: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BlendSpace2DConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BlendSpace2DConfig {
        self.revision += 1;
        &mut self.config
    }

    pub fn set_axis(&mut self, axis: Axis, config: AxisConfig) {
        let target = self.axis_mut(axis);
        *target = config;
    }

    pub fn set_calculation_method(&mut self, axis: Axis, method: CalculationMethod) {
        self.axis_mut(axis).calculation_method = method;
    }

    pub fn set_evaluator(&mut self, axis: Axis, evaluator: &str) {
        self.axis_mut(axis).evaluator = evaluator.to_owned();
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisConfig {
        let config = self.config_mut();
        match axis {
            Axis::X => &mut config.axis_x,
            Axis::Y => &mut config.axis_y,
        }
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.config.axis_x,
            Axis::Y => &self.config.axis_y,
        }
    }

    /// Applies the evaluator of `axis` to every motion whose coordinate was
    /// not set by hand.
    fn compute_axis(&self, axis: Axis, data: &mut BlendSpaceUniqueData, evaluator: Option<&dyn ParamEvaluator>) {
        let broken_auto = self.axis(axis).calculation_method == CalculationMethod::Auto && evaluator.is_none();
        if evaluator.is_none() && !broken_auto {
            return;
        }

        for info in &mut data.motion_infos {
            let user_set = self
                .config
                .settings
                .motions
                .get(info.config_index)
                .is_some_and(|motion| motion.is_user_set(axis));
            if user_set {
                continue;
            }
            let value = evaluator.map_or(0.0, |evaluator| evaluator.compute_param_value(&info.instance));
            match axis {
                Axis::X => info.position.x = value,
                Axis::Y => info.position.y = value,
            }
        }
    }
}

impl BlendSpace for BlendSpace2DNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &BlendSpaceSettings {
        &self.config.settings
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn axis_issues(&self, manager: &BlendSpaceManager) -> Vec<ConfigIssue> {
        let mut issues: Vec<ConfigIssue> = [(&self.config.axis_x, Axis::X), (&self.config.axis_y, Axis::Y)]
            .into_iter()
            .filter_map(|(config, axis)| axis_issue(config, axis, manager))
            .collect();

        let x = axis_evaluator(&self.config.axis_x, manager);
        let y = axis_evaluator(&self.config.axis_y, manager);
        if let (Some(x), Some(y)) = (x, y) {
            if x.name().eq_ignore_ascii_case(y.name()) {
                issues.push(ConfigIssue::DuplicateEvaluator {
                    name: x.name().to_owned(),
                });
            }
        }
        issues
    }

    fn build_geometry(&self, data: &mut BlendSpaceUniqueData, manager: &BlendSpaceManager) {
        self.compute_axis(Axis::X, data, axis_evaluator(&self.config.axis_x, manager));
        self.compute_axis(Axis::Y, data, axis_evaluator(&self.config.axis_y, manager));

        let positions: Vec<Vec2> = data.motion_infos.iter().map(|info| info.position).collect();
        data.normalization = Normalization::from_points(&positions);
        data.normalized_positions = data.normalization.normalize_all(&positions);

        let (triangles, report) = triangulate_with_report(manager.triangulator(), &data.normalized_positions);
        data.outer_edges = outer_edges(&triangles);
        data.fallback_chain = if triangles.is_empty() {
            principal_axis_chain(&data.normalized_positions)
        } else {
            Vec::new()
        };
        data.diagnostics = GeometryDiagnostics::from_geometry(&data.normalized_positions, &report, &data.outer_edges);
        data.triangles = triangles;
    }

    fn query_position(&self, instance: &AnimGraphInstance, data: &BlendSpaceUniqueData) -> Vec2 {
        let fallback = data.interactive_position.unwrap_or(data.current_position);
        let x_param = self.config.axis_x.parameter.as_deref();
        let y_param = self.config.axis_y.parameter.as_deref();

        // A Vector2 parameter on X drives both axes.
        if y_param.is_none() {
            if let Some(Ok(value)) = x_param.and_then(|name| instance.parameter(name)).map(Value::expect_vector2) {
                return value;
            }
        }

        Vec2::new(
            parameter_coordinate(instance, x_param, Axis::X).unwrap_or(fallback.x),
            parameter_coordinate(instance, y_param, Axis::Y).unwrap_or(fallback.y),
        )
    }

    fn locate(&self, data: &BlendSpaceUniqueData, query: Vec2) -> CurrentLocation {
        let geometry = Geometry2D {
            points: &data.normalized_positions,
            triangles: &data.triangles,
            outer_edges: &data.outer_edges,
            fallback_chain: &data.fallback_chain,
        };
        locate_2d(&geometry, data.normalization.normalize(query))
    }
}
