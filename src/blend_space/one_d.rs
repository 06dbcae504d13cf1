use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::config::{Axis, AxisConfig, BlendSpaceSettings, CalculationMethod, ConfigIssue};
use super::locate::{CurrentLocation, locate_1d};
use super::manager::BlendSpaceManager;
use super::unique_data::BlendSpaceUniqueData;
use super::{BlendSpace, axis_evaluator, axis_issue, parameter_coordinate};
use crate::geom::{GeometryDiagnostics, Normalization};
use crate::graph::instance::AnimGraphInstance;
use crate::graph::node::NodeId;

/// Configuration of a 1D blend space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlendSpace1DConfig {
    pub settings: BlendSpaceSettings,
    pub axis: AxisConfig,
}

/// Blends motions placed along a single axis.
#[derive(Debug, Clone)]
pub struct BlendSpace1DNode {
    id: NodeId,
    name: String,
    config: BlendSpace1DConfig,
    revision: u64,
}

impl BlendSpace1DNode {
    #[must_use]
    pub fn new(name: impl Into<String>, config: BlendSpace1DConfig) -> Self {
        Self {
            id: NodeId::default(),
            name: name.into(),
            config,
            revision: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BlendSpace1DConfig {
        &self.config
    }

    /// Instances rebuild their geometry on the next update.
    pub fn config_mut(&mut self) -> &mut BlendSpace1DConfig {
        self.revision += 1;
        &mut self.config
    }

    pub fn set_axis(&mut self, axis: AxisConfig) {
        self.config_mut().axis = axis;
    }

    pub fn set_calculation_method(&mut self, method: CalculationMethod) {
        self.config_mut().axis.calculation_method = method;
    }

    pub fn set_evaluator(&mut self, evaluator: &str) {
        self.config_mut().axis.evaluator = evaluator.to_owned();
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl BlendSpace for BlendSpace1DNode {
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
        1
    }

    fn axis_issues(&self, manager: &BlendSpaceManager) -> Vec<ConfigIssue> {
        axis_issue(&self.config.axis, Axis::X, manager).into_iter().collect()
    }

    fn build_geometry(&self, data: &mut BlendSpaceUniqueData, manager: &BlendSpaceManager) {
        let axis = &self.config.axis;
        let evaluator = axis_evaluator(axis, manager);
        let broken_auto = axis.calculation_method == CalculationMethod::Auto && evaluator.is_none();

        for info in &mut data.motion_infos {
            let user_set = self
                .config
                .settings
                .motions
                .get(info.config_index)
                .is_some_and(|motion| motion.user_set_x);
            if user_set {
                continue;
            }
            if let Some(evaluator) = evaluator {
                info.position.x = evaluator.compute_param_value(&info.instance);
            } else if broken_auto {
                info.position.x = 0.0;
            }
        }

        let values: Vec<f32> = data.motion_infos.iter().map(|info| info.position.x).collect();
        let mut sorted: Vec<usize> = (0..values.len()).collect();
        sorted.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));
        let sorted_values: Vec<f32> = sorted.iter().map(|&index| values[index]).collect();

        data.diagnostics = GeometryDiagnostics::from_sorted_values(&sorted_values);
        let points: Vec<Vec2> = values.iter().map(|&x| Vec2::new(x, 0.0)).collect();
        data.normalization = Normalization::from_points(&points);
        data.sorted_indices = sorted;
    }

    fn query_position(&self, instance: &AnimGraphInstance, data: &BlendSpaceUniqueData) -> Vec2 {
        let x = parameter_coordinate(instance, self.config.axis.parameter.as_deref(), Axis::X)
            .or_else(|| data.interactive_position.map(|position| position.x))
            .unwrap_or(data.current_position.x);
        Vec2::new(x, 0.0)
    }

    fn locate(&self, data: &BlendSpaceUniqueData, query: Vec2) -> CurrentLocation {
        let values: Vec<f32> = data.motion_infos.iter().map(|info| info.position.x).collect();
        locate_1d(&data.sorted_indices, &values, query.x)
    }
}
