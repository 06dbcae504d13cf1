//! Parser voor blend-space definities in XML.
//!
//! ```xml
//! <blendspaces>
//!   <blendspace1d name="Locomotion" sync="clip" leader="walk" events="most">
//!     <axis method="manual" parameter="speed"/>
//!     <motion id="idle" x="0"/>
//!     <motion id="walk" x="5"/>
//!   </blendspace1d>
//!   <blendspace2d name="Strafe" inplace="true">
//!     <x-axis method="auto" evaluator="Left-right velocity"/>
//!     <y-axis method="auto" evaluator="Front-back velocity"/>
//!     <motion id="fwd" x="0" y="1" user-x="true"/>
//!   </blendspace2d>
//! </blendspaces>
//! ```

use glam::Vec2;
use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

use crate::blend_space::{
    AxisConfig, BlendSpace1DConfig, BlendSpace1DNode, BlendSpace2DConfig, BlendSpace2DNode,
    BlendSpaceMotion, BlendSpaceNode, BlendSpaceSettings, CalculationMethod, EventFilterMode,
    NULL_EVALUATOR, SyncMode, UnknownModeError,
};
use crate::graph::{AnimGraph, GraphError};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result type voor het parsen van blend-space definities.
pub type ParseResult<T> = Result<T, ParseError>;

/// Beschrijft fouten tijdens het parsen.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Het XML-document kon niet gede-serialiseerd worden.
    #[error("XML parsefout: {0}")]
    Xml(#[from] quick_xml::DeError),
    /// Een modus-attribuut heeft een onbekende waarde.
    #[error("ongeldige modus: {0}")]
    Mode(#[from] UnknownModeError),
    /// Een definitie is inhoudelijk ongeldig.
    #[error("ongeldige definitie '{name}': {reason}")]
    Definition { name: String, reason: String },
    /// De graph bevat een inconsistente verwijzing.
    #[error("ongeldige graphreferentie: {0}")]
    Graph(String),
}

impl From<GraphError> for ParseError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err.to_string())
    }
}

/// Configuratie van één blend space uit het document.
#[derive(Debug, Clone, PartialEq)]
pub enum BlendSpaceConfig {
    OneD(BlendSpace1DConfig),
    TwoD(BlendSpace2DConfig),
}

/// Een benoemde blend-space definitie.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendSpaceDefinition {
    pub name: String,
    pub config: BlendSpaceConfig,
}

impl BlendSpaceDefinition {
    #[must_use]
    pub fn into_node(self) -> BlendSpaceNode {
        match self.config {
            BlendSpaceConfig::OneD(config) => BlendSpace1DNode::new(self.name, config).into(),
            BlendSpaceConfig::TwoD(config) => BlendSpace2DNode::new(self.name, config).into(),
        }
    }
}

/// Leest een document met blend-space definities.
pub fn parse_str(input: &str) -> ParseResult<Vec<BlendSpaceDefinition>> {
    let trimmed = strip_xml_preamble(input);
    let prefix = trimmed.chars().take(12).collect::<String>().to_lowercase();
    if !prefix.starts_with("<blendspaces") {
        return Err(ParseError::Graph(
            "onbekend formaat: geen <blendspaces> root gevonden".to_owned(),
        ));
    }

    let document: RawDocument = from_str(trimmed)?;
    log::debug!("{} blend-space definities gevonden", document.definitions.len());
    build_definitions(document.definitions)
}

/// Leest een document en bouwt er nodes van.
pub fn parse_nodes(input: &str) -> ParseResult<Vec<BlendSpaceNode>> {
    Ok(parse_str(input)?
        .into_iter()
        .map(BlendSpaceDefinition::into_node)
        .collect())
}

/// Leest een document en zet alle definities in een graph. De eerste
/// definitie wordt de root.
pub fn parse_graph(input: &str) -> ParseResult<AnimGraph> {
    let mut graph = AnimGraph::new();
    for node in parse_nodes(input)? {
        graph.add_node(node)?;
    }
    Ok(graph)
}

fn strip_xml_preamble(input: &str) -> &str {
    let trimmed = input.trim_start_matches(|c: char| c == '\u{feff}' || c.is_whitespace());
    if let Some(rest) = trimmed.strip_prefix("<?xml") {
        if let Some(idx) = rest.find("?>") {
            return rest[idx + 2..].trim_start();
        }
    }
    trimmed
}

#[cfg(feature = "parallel")]
fn build_definitions(raw: Vec<RawDefinition>) -> ParseResult<Vec<BlendSpaceDefinition>> {
    raw.into_par_iter().map(RawDefinition::build).collect()
}

#[cfg(not(feature = "parallel"))]
fn build_definitions(raw: Vec<RawDefinition>) -> ParseResult<Vec<BlendSpaceDefinition>> {
    raw.into_iter().map(RawDefinition::build).collect()
}

#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default, rename = "$value")]
    definitions: Vec<RawDefinition>,
}

#[derive(Debug, Deserialize)]
enum RawDefinition {
    #[serde(rename = "blendspace1d")]
    OneD(RawBlendSpace1D),
    #[serde(rename = "blendspace2d")]
    TwoD(RawBlendSpace2D),
}

macro_rules! raw_settings {
    ($raw:expr) => {
        RawSettings {
            name: $raw.name,
            sync: $raw.sync,
            leader: $raw.leader,
            events: $raw.events,
            in_place: $raw.in_place,
            disabled: $raw.disabled,
        }
    };
}

impl RawDefinition {
    fn build(self) -> ParseResult<BlendSpaceDefinition> {
        match self {
            Self::OneD(raw) => {
                let axis = raw.axis.map(RawAxis::build).transpose()?.unwrap_or_default();
                let motions = raw.motions;
                let raw_settings = raw_settings!(raw);
                let settings = raw_settings.build(&motions, false)?;
                Ok(BlendSpaceDefinition {
                    name: raw_settings.name,
                    config: BlendSpaceConfig::OneD(BlendSpace1DConfig { settings, axis }),
                })
            }
            Self::TwoD(raw) => {
                let axis_x = raw.axis_x.map(RawAxis::build).transpose()?.unwrap_or_default();
                let axis_y = raw.axis_y.map(RawAxis::build).transpose()?.unwrap_or_default();
                let motions = raw.motions;
                let raw_settings = raw_settings!(raw);
                let settings = raw_settings.build(&motions, true)?;
                Ok(BlendSpaceDefinition {
                    name: raw_settings.name,
                    config: BlendSpaceConfig::TwoD(BlendSpace2DConfig {
                        settings,
                        axis_x,
                        axis_y,
                    }),
                })
            }
        }
    }
}

/// Attributen die 1D en 2D delen.
#[derive(Debug)]
struct RawSettings {
    name: String,
    sync: Option<String>,
    leader: Option<String>,
    events: Option<String>,
    in_place: bool,
    disabled: bool,
}

impl RawSettings {
    fn build(&self, motions: &[RawMotion], two_dimensional: bool) -> ParseResult<BlendSpaceSettings> {
        let motions = motions
            .iter()
            .map(|motion| motion.build(&self.name, two_dimensional))
            .collect::<ParseResult<Vec<_>>>()?;

        Ok(BlendSpaceSettings {
            motions,
            sync_mode: self.sync.as_deref().map(str::parse::<SyncMode>).transpose()?.unwrap_or_default(),
            sync_leader: self
                .leader
                .as_deref()
                .map(str::trim)
                .filter(|leader| !leader.is_empty())
                .map(str::to_owned),
            event_filter_mode: self
                .events
                .as_deref()
                .map(str::parse::<EventFilterMode>)
                .transpose()?
                .unwrap_or_default(),
            in_place: self.in_place,
            disabled: self.disabled,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawBlendSpace1D {
    #[serde(default, rename = "@name")]
    name: String,
    #[serde(default, rename = "@sync")]
    sync: Option<String>,
    #[serde(default, rename = "@leader")]
    leader: Option<String>,
    #[serde(default, rename = "@events")]
    events: Option<String>,
    #[serde(default, rename = "@inplace")]
    in_place: bool,
    #[serde(default, rename = "@disabled")]
    disabled: bool,
    #[serde(default)]
    axis: Option<RawAxis>,
    #[serde(default, rename = "motion")]
    motions: Vec<RawMotion>,
}

#[derive(Debug, Deserialize)]
struct RawBlendSpace2D {
    #[serde(default, rename = "@name")]
    name: String,
    #[serde(default, rename = "@sync")]
    sync: Option<String>,
    #[serde(default, rename = "@leader")]
    leader: Option<String>,
    #[serde(default, rename = "@events")]
    events: Option<String>,
    #[serde(default, rename = "@inplace")]
    in_place: bool,
    #[serde(default, rename = "@disabled")]
    disabled: bool,
    #[serde(default, rename = "x-axis")]
    axis_x: Option<RawAxis>,
    #[serde(default, rename = "y-axis")]
    axis_y: Option<RawAxis>,
    #[serde(default, rename = "motion")]
    motions: Vec<RawMotion>,
}

#[derive(Debug, Deserialize)]
struct RawAxis {
    #[serde(default, rename = "@method")]
    method: Option<String>,
    #[serde(default, rename = "@evaluator")]
    evaluator: Option<String>,
    #[serde(default, rename = "@parameter")]
    parameter: Option<String>,
}

impl RawAxis {
    fn build(self) -> ParseResult<AxisConfig> {
        Ok(AxisConfig {
            calculation_method: self
                .method
                .as_deref()
                .map(str::parse::<CalculationMethod>)
                .transpose()?
                .unwrap_or_default(),
            evaluator: self
                .evaluator
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| NULL_EVALUATOR.to_owned()),
            parameter: self
                .parameter
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawMotion {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default, rename = "@x")]
    x: f32,
    #[serde(default, rename = "@y")]
    y: f32,
    #[serde(default, rename = "@user-x")]
    user_x: bool,
    #[serde(default, rename = "@user-y")]
    user_y: bool,
}

impl RawMotion {
    fn build(&self, owner: &str, two_dimensional: bool) -> ParseResult<BlendSpaceMotion> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(ParseError::Definition {
                name: owner.to_owned(),
                reason: "motion zonder id".to_owned(),
            });
        }
        let y = if two_dimensional { self.y } else { 0.0 };
        if !self.x.is_finite() || !y.is_finite() {
            return Err(ParseError::Definition {
                name: owner.to_owned(),
                reason: format!("positie van motion '{id}' is geen eindig getal"),
            });
        }

        Ok(BlendSpaceMotion::new(id, Vec2::new(self.x, y)).user_set(self.user_x, two_dimensional && self.user_y))
    }
}
