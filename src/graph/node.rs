//! Identifiers en de levenscyclus van nodes binnen de animatiegraph.

use super::instance::{AnimGraphContext, AnimGraphInstance};
use crate::pose::Pose;

/// Identifier voor een node binnen de graph.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}

/// Identifier voor een graph-instantie (één karakter dat de graph afspeelt).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
pub struct InstanceId(pub u64);

impl InstanceId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Levenscyclus van een node. Configuratie is gedeeld en onveranderlijk
/// tijdens een frame; alle toestand per instantie leeft in de unique data
/// van de `AnimGraphInstance`.
///
/// Per frame worden de fases in deze volgorde aangeroepen: `update`,
/// `top_down_update`, `post_update`, `output`.
pub trait AnimGraphNode {
    fn id(&self) -> NodeId;

    fn name(&self) -> &str;

    /// Maakt de unique data voor de instantie aan.
    fn init(&self, instance: &mut AnimGraphInstance, ctx: &AnimGraphContext);

    /// Bepaalt gewichten en laat de tijd van de motions verstrijken.
    fn update(&self, instance: &mut AnimGraphInstance, ctx: &AnimGraphContext, time_passed: f32);

    /// Synchroniseert volgers met de leidende motion.
    fn top_down_update(&self, instance: &mut AnimGraphInstance, ctx: &AnimGraphContext);

    /// Verzamelt events en trajectdelta.
    fn post_update(&self, instance: &mut AnimGraphInstance, ctx: &AnimGraphContext);

    /// Schrijft de geblende pose naar `out`.
    fn output(&self, instance: &mut AnimGraphInstance, ctx: &AnimGraphContext, out: &mut Pose);

    /// Zet alle motions terug naar het begin.
    fn rewind(&self, instance: &mut AnimGraphInstance);

    /// Gooit de unique data weg; wordt bij de volgende update opnieuw
    /// opgebouwd.
    fn invalidate_unique_data(&self, instance: &mut AnimGraphInstance);

    /// De motion set van de instantie is gewisseld; motions worden opnieuw
    /// opgelost.
    fn on_motion_set_changed(&self, instance: &mut AnimGraphInstance) {
        self.invalidate_unique_data(instance);
    }
}

#[cfg(test)]
mod tests {
    use super::{InstanceId, NodeId};

    #[test]
    fn ids_convert_and_order() {
        assert_eq!(NodeId::from(3), NodeId::new(3));
        assert!(NodeId::new(1) < NodeId::new(2));
        assert_eq!(InstanceId::default(), InstanceId::new(0));
    }
}
