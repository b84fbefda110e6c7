// Process graph model
// Nodes, flows and the ordered process graph shared by the simulator,
// the rewriter and the search engine.

pub mod builder;
pub mod export;
pub mod flow;
pub mod graph;
pub mod ids;
pub mod node;
pub mod validate;

mod traversal;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types for convenient access
pub use builder::ProcessBuilder;
pub use export::{FlowElement, GatewayDirection, GatewayElement, InterchangeDocument, TaskElement};
pub use flow::{Flow, FlowStrength};
pub use graph::ProcessGraph;
pub use ids::IdGenerator;
pub use node::{Activity, GatewayKind, Node, NodeKind};
pub use validate::validate;

pub use flowopt_error::{GraphError, GraphResult};

// Core identifiers
pub type NodeId = String;
pub type FlowId = String;
pub type ResourceName = String;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
