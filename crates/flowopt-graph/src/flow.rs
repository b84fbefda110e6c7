// Flow (sequence edge) of a process graph

use serde::{Deserialize, Serialize};

use crate::{FlowId, NodeId};

/// Whether a flow carries an ordering obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStrength {
    #[default]
    Weak,
    /// Causal ordering that refactoring must keep
    Strong,
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub strength: FlowStrength,
}

impl Flow {
    /// Create a weak flow
    pub fn new(id: impl Into<FlowId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            strength: FlowStrength::Weak,
        }
    }

    /// Create a strong flow
    pub fn strong(id: impl Into<FlowId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            strength: FlowStrength::Strong,
            ..Self::new(id, source, target)
        }
    }

    pub fn is_strong(&self) -> bool {
        self.strength == FlowStrength::Strong
    }
}
