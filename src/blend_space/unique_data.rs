use glam::Vec2;
use serde::Serialize;

use super::config::ConfigIssue;
use super::locate::{BlendInfo, CurrentLocation};
use super::motion_info::MotionInfo;
use crate::geom::{Edge, GeometryDiagnostics, Normalization, Triangle};
use crate::motion::EventBuffer;
use crate::pose::Transform;

/// Progress of a node instance through its per-frame work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NodeState {
    /// Nothing resolved yet, or invalidated.
    #[default]
    Uninitialized,
    /// Motions and geometry are built; no location computed yet.
    MotionsResolved,
    /// A location and blend weights are available.
    Located,
}

/// Everything a blend-space node keeps per graph instance.
#[derive(Debug, Default)]
pub struct BlendSpaceUniqueData {
    pub state: NodeState,
    /// Node revision the geometry was built for.
    pub built_revision: Option<u64>,
    /// Motion set revision of the instance the motions were resolved with.
    pub built_motion_set_revision: Option<u64>,

    pub motion_infos: Vec<MotionInfo>,
    pub issues: Vec<ConfigIssue>,

    pub normalization: Normalization,
    /// Motion positions in normalized space (2D only).
    pub normalized_positions: Vec<Vec2>,
    /// Motion indices sorted by X (1D only).
    pub sorted_indices: Vec<usize>,
    pub triangles: Vec<Triangle>,
    pub outer_edges: Vec<Edge>,
    pub fallback_chain: Vec<usize>,
    pub diagnostics: GeometryDiagnostics,

    /// Position set interactively, used when no parameter drives the axis.
    pub interactive_position: Option<Vec2>,
    /// Query position of the last update, in blend-space units.
    pub current_position: Vec2,
    pub location: CurrentLocation,
    pub blend_infos: Vec<BlendInfo>,
    pub leader: Option<usize>,

    pub events: EventBuffer,
    pub trajectory_delta: Transform,
}

impl BlendSpaceUniqueData {
    /// Drops resolved motions and geometry but keeps the interactive
    /// position.
    pub fn reset(&mut self) {
        let interactive_position = self.interactive_position;
        *self = Self {
            interactive_position,
            ..Self::default()
        };
    }

    #[must_use]
    pub fn is_built_for(&self, revision: u64, motion_set_revision: u64) -> bool {
        self.built_revision == Some(revision)
            && self.built_motion_set_revision == Some(motion_set_revision)
    }

    /// Weight of a motion by id; 0 when inactive or unknown.
    #[must_use]
    pub fn weight_of(&self, motion_id: &str) -> f32 {
        self.blend_infos
            .iter()
            .filter(|bi| {
                self.motion_infos
                    .get(bi.motion_index)
                    .is_some_and(|info| info.motion_id == motion_id)
            })
            .map(|bi| bi.weight)
            .sum()
    }

    /// Motion ids paired with their weights, in motion order.
    #[must_use]
    pub fn weights(&self) -> Vec<(String, f32)> {
        self.blend_infos
            .iter()
            .filter_map(|bi| {
                self.motion_infos
                    .get(bi.motion_index)
                    .map(|info| (info.motion_id.clone(), bi.weight))
            })
            .collect()
    }
}
