//! Tokens moving through a process during simulation

use serde::{Deserialize, Serialize};

use flowopt_graph::{FlowId, NodeId};

use crate::Tick;

/// Where a token currently sits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenLocation {
    /// Waiting on a flow to be consumed by its target
    Flow(FlowId),
    /// Inside a running activity
    Activity(NodeId),
}

/// A token with the time it still has to spend at its location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Unique within one run
    pub serial: u64,
    pub location: TokenLocation,
    pub remaining: Tick,
}

impl Token {
    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }

    pub fn is_on_flow(&self, flow: &str) -> bool {
        matches!(&self.location, TokenLocation::Flow(id) if id == flow)
    }
}
