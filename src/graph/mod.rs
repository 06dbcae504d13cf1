//! Kern datastructuren voor het modelleren van animatiegrafen met blend
//! spaces.

use std::collections::HashMap;
use std::fmt;

pub mod frame;
pub mod instance;
pub mod node;
pub mod value;

use crate::blend_space::BlendSpaceNode;
use instance::AnimGraphInstance;
use node::{AnimGraphNode, NodeId};

/// Graph container met indices voor snelle lookups. De configuratie van
/// de nodes wordt gedeeld door alle instanties.
#[derive(Debug, Clone, Default)]
pub struct AnimGraph {
    nodes: Vec<BlendSpaceNode>,
    node_index: HashMap<NodeId, usize>,
    name_index: HashMap<String, Vec<NodeId>>,
    root: Option<NodeId>,
    next_id: usize,
}

impl AnimGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Voeg een node toe aan de graph. Als het id van de node niet gezet is,
    /// wordt een nieuw id uitgegeven. De eerste node wordt de root.
    pub fn add_node(&mut self, node: impl Into<BlendSpaceNode>) -> Result<NodeId, GraphError> {
        let mut node = node.into();
        let id = if node.id() == NodeId::default() {
            let assigned = NodeId::new(self.next_id);
            self.next_id += 1;
            node.set_id(assigned);
            assigned
        } else {
            self.next_id = self.next_id.max(node.id().0 + 1);
            node.id()
        };

        if self.node_index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }

        self.node_index.insert(id, self.nodes.len());
        let key = normalize_name(node.name());
        self.name_index.entry(key).or_default().push(id);
        self.root.get_or_insert(id);

        self.nodes.push(node);
        Ok(id)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&BlendSpaceNode> {
        self.node_index
            .get(&id)
            .and_then(|idx| self.nodes.get(*idx))
    }

    /// Instanties bouwen hun unique data opnieuw op zodra de configuratie
    /// van de node wijzigt.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut BlendSpaceNode> {
        self.node_index
            .get(&id)
            .copied()
            .and_then(move |idx| self.nodes.get_mut(idx))
    }

    #[must_use]
    pub fn nodes(&self) -> &[BlendSpaceNode] {
        &self.nodes
    }

    #[must_use]
    pub fn nodes_with_name(&self, name: &str) -> Option<&[NodeId]> {
        self.name_index
            .get(&normalize_name(name))
            .map(|ids| ids.as_slice())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn set_root(&mut self, id: NodeId) -> Result<(), GraphError> {
        if !self.node_index.contains_key(&id) {
            return Err(GraphError::UnknownNode(id));
        }
        self.root = Some(id);
        Ok(())
    }

    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Geeft de root-node terug, of een fout als er geen is.
    pub fn root_node(&self) -> Result<&BlendSpaceNode, GraphError> {
        let id = self.root.ok_or(GraphError::NoRootNode)?;
        self.node(id).ok_or(GraphError::UnknownNode(id))
    }

    /// Meldt aan alle nodes dat de motion set van de instantie is gewisseld.
    pub fn on_motion_set_changed(&self, instance: &mut AnimGraphInstance) {
        for node in &self.nodes {
            node.on_motion_set_changed(instance);
        }
    }

    /// Ruimt een instantie op. Alle motion instances gaan terug naar hun
    /// pool.
    pub fn remove_instance(&self, mut instance: AnimGraphInstance) {
        for node in &self.nodes {
            node.invalidate_unique_data(&mut instance);
        }
        log::debug!("instantie {:?} verwijderd", instance.id());
    }
}

/// Fouten die kunnen optreden bij het opbouwen of evalueren van de graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DuplicateNode(NodeId),
    UnknownNode(NodeId),
    NoRootNode,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode(id) => write!(f, "node {:?} bestaat al in de graph", id.0),
            Self::UnknownNode(id) => write!(f, "node {:?} niet gevonden in graph", id.0),
            Self::NoRootNode => write!(f, "graph heeft geen root-node"),
        }
    }
}

impl std::error::Error for GraphError {}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
