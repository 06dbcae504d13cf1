use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How sample positions are obtained along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalculationMethod {
    /// Positions are entered by hand.
    #[default]
    Manual,
    /// Positions are measured from the motions by the axis evaluator.
    Auto,
}

/// How the playheads of the blended motions are kept in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncMode {
    #[default]
    Disabled,
    /// Align matching sync-track segments; clip-based when a track is empty.
    TrackBased,
    /// Align normalized playback time.
    ClipBased,
}

/// Which motions may emit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventFilterMode {
    #[default]
    AllActiveMotions,
    MostActiveMotion,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::Y => f.write_str("Y"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownModeError {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownModeError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

fn mode_key(value: &str) -> String {
    value.trim().to_lowercase().replace(['-', '_', ' '], "")
}

impl FromStr for CalculationMethod {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match mode_key(s).as_str() {
            "manual" => Ok(Self::Manual),
            "auto" | "automatic" => Ok(Self::Auto),
            _ => Err(UnknownModeError::new("calculation method", s)),
        }
    }
}

impl FromStr for SyncMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match mode_key(s).as_str() {
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            "track" | "trackbased" => Ok(Self::TrackBased),
            "clip" | "clipbased" => Ok(Self::ClipBased),
            _ => Err(UnknownModeError::new("sync mode", s)),
        }
    }
}

impl FromStr for EventFilterMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match mode_key(s).as_str() {
            "all" | "allactive" | "allactivemotions" => Ok(Self::AllActiveMotions),
            "most" | "mostactive" | "mostactivemotion" => Ok(Self::MostActiveMotion),
            "none" | "off" => Ok(Self::None),
            _ => Err(UnknownModeError::new("event filter mode", s)),
        }
    }
}

/// A motion placed in the blend space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendSpaceMotion {
    pub motion_id: String,
    /// Authored position; Y is ignored by 1D blend spaces.
    pub position: Vec2,
    /// The X coordinate was set by hand and is kept in automatic mode.
    pub user_set_x: bool,
    pub user_set_y: bool,
}

impl BlendSpaceMotion {
    #[must_use]
    pub fn new(motion_id: impl Into<String>, position: Vec2) -> Self {
        Self {
            motion_id: motion_id.into(),
            position,
            user_set_x: false,
            user_set_y: false,
        }
    }

    #[must_use]
    pub fn at_x(motion_id: impl Into<String>, x: f32) -> Self {
        Self::new(motion_id, Vec2::new(x, 0.0))
    }

    #[must_use]
    pub fn user_set(mut self, x: bool, y: bool) -> Self {
        self.user_set_x = x;
        self.user_set_y = y;
        self
    }

    #[must_use]
    pub fn is_user_set(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.user_set_x,
            Axis::Y => self.user_set_y,
        }
    }
}

/// Settings shared by 1D and 2D blend spaces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlendSpaceSettings {
    pub motions: Vec<BlendSpaceMotion>,
    pub sync_mode: SyncMode,
    /// Motion that drives synchronization; the most weighted one when unset.
    pub sync_leader: Option<String>,
    pub event_filter_mode: EventFilterMode,
    /// Remove the trajectory from the output pose.
    pub in_place: bool,
    pub disabled: bool,
}

/// Position source of one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub calculation_method: CalculationMethod,
    /// Name of the parameter evaluator, see `EvaluatorRegistry`.
    pub evaluator: String,
    /// Graph parameter that feeds the query coordinate.
    pub parameter: Option<String>,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            calculation_method: CalculationMethod::Manual,
            evaluator: super::evaluator::NULL_EVALUATOR.to_owned(),
            parameter: None,
        }
    }
}

impl AxisConfig {
    #[must_use]
    pub fn manual(parameter: Option<&str>) -> Self {
        Self {
            parameter: parameter.map(str::to_owned),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn auto(evaluator: &str, parameter: Option<&str>) -> Self {
        Self {
            calculation_method: CalculationMethod::Auto,
            evaluator: evaluator.to_owned(),
            parameter: parameter.map(str::to_owned),
        }
    }
}

/// Configuration problems reported by validation. None of them stops
/// evaluation; affected motions or axes are skipped or left at their
/// authored values.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum ConfigIssue {
    #[error("axis {axis} computes positions automatically but has no evaluator")]
    MissingEvaluator { axis: Axis },
    #[error("unknown evaluator '{name}' on axis {axis}")]
    UnknownEvaluator { axis: Axis, name: String },
    #[error("evaluator '{name}' is used on both axes")]
    DuplicateEvaluator { name: String },
    #[error("motion '{motion_id}' could not be resolved{}", suggestion_suffix(.suggestion))]
    UnresolvedMotion {
        motion_id: String,
        suggestion: Option<String>,
    },
    #[error("sync leader '{0}' is not one of the blend-space motions")]
    UnknownSyncLeader(String),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(", did you mean '{s}'?"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes_case_insensitively() {
        assert_eq!("Auto".parse::<CalculationMethod>(), Ok(CalculationMethod::Auto));
        assert_eq!(" track ".parse::<SyncMode>(), Ok(SyncMode::TrackBased));
        assert_eq!("MOST".parse::<EventFilterMode>(), Ok(EventFilterMode::MostActiveMotion));
    }

    #[test]
    fn unknown_mode_is_reported() {
        let err = "sometimes".parse::<SyncMode>().unwrap_err();
        assert_eq!(err.kind, "sync mode");
        assert_eq!(err.to_string(), "unknown sync mode 'sometimes'");
    }

    #[test]
    fn unresolved_motion_mentions_suggestion() {
        let issue = ConfigIssue::UnresolvedMotion {
            motion_id: "wlak".into(),
            suggestion: Some("walk".into()),
        };
        assert_eq!(
            issue.to_string(),
            "motion 'wlak' could not be resolved, did you mean 'walk'?"
        );
    }
}
