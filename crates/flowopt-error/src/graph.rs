// Graph-model error types
// Raised when a process graph violates its structural invariants

use std::any::Any;

use thiserror::Error;

use crate::{ErrorCode, ErrorDomain, FlowoptError};

/// Graph error codes
pub mod codes {
    use crate::ErrorCode;

    // Graph error codes start with 1000
    pub const MISSING_START: ErrorCode = ErrorCode(1001);
    pub const MULTIPLE_STARTS: ErrorCode = ErrorCode(1002);
    pub const MISSING_END: ErrorCode = ErrorCode(1003);
    pub const DANGLING_FLOW: ErrorCode = ErrorCode(1004);
    pub const INVALID_ARITY: ErrorCode = ErrorCode(1005);
    pub const UNKNOWN_NODE: ErrorCode = ErrorCode(1006);
    pub const UNKNOWN_FLOW: ErrorCode = ErrorCode(1007);
    pub const DUPLICATE_ID: ErrorCode = ErrorCode(1008);
    pub const AMBIGUOUS_TASK_ID: ErrorCode = ErrorCode(1009);
}

/// Structural errors of a process graph.
///
/// Every variant describes a malformed graph: nothing downstream can run on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// No Start node
    #[error("Malformed graph: no Start node")]
    MissingStart,

    /// More than one Start node
    #[error("Malformed graph: several Start nodes ({})", .0.join(", "))]
    MultipleStarts(Vec<String>),

    /// No End node
    #[error("Malformed graph: no End node")]
    MissingEnd,

    /// A flow endpoint does not resolve to a node
    #[error("Malformed graph: flow {flow} references unknown node {node}")]
    DanglingFlow { flow: String, node: String },

    /// A node has the wrong number of incoming or outgoing flows
    #[error("Malformed graph: node {node} {reason}")]
    InvalidArity { node: String, reason: String },

    /// Lookup of a node id that is not part of the graph
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Lookup of a flow id that is not part of the graph
    #[error("Unknown flow: {0}")]
    UnknownFlow(String),

    /// Identifier already used by another node or flow
    #[error("Duplicate identifier: {0}")]
    DuplicateId(String),

    /// A task id that reads as a rewrite copy of another task
    #[error("Task id {id} is reserved for copies of task {task}")]
    AmbiguousTaskId { id: String, task: String },
}

impl GraphError {
    /// Create an arity error for a node
    pub fn arity(node: impl Into<String>, reason: impl Into<String>) -> Self {
        GraphError::InvalidArity {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Create a dangling flow error
    pub fn dangling(flow: impl Into<String>, node: impl Into<String>) -> Self {
        GraphError::DanglingFlow {
            flow: flow.into(),
            node: node.into(),
        }
    }
}

impl FlowoptError for GraphError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            GraphError::MissingStart => MISSING_START,
            GraphError::MultipleStarts(_) => MULTIPLE_STARTS,
            GraphError::MissingEnd => MISSING_END,
            GraphError::DanglingFlow { .. } => DANGLING_FLOW,
            GraphError::InvalidArity { .. } => INVALID_ARITY,
            GraphError::UnknownNode(_) => UNKNOWN_NODE,
            GraphError::UnknownFlow(_) => UNKNOWN_FLOW,
            GraphError::DuplicateId(_) => DUPLICATE_ID,
            GraphError::AmbiguousTaskId { .. } => AMBIGUOUS_TASK_ID,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Graph
    }

    fn error_code(&self) -> &'static str {
        match self {
            GraphError::MissingStart => "GRAPH_MISSING_START",
            GraphError::MultipleStarts(_) => "GRAPH_MULTIPLE_STARTS",
            GraphError::MissingEnd => "GRAPH_MISSING_END",
            GraphError::DanglingFlow { .. } => "GRAPH_DANGLING_FLOW",
            GraphError::InvalidArity { .. } => "GRAPH_INVALID_ARITY",
            GraphError::UnknownNode(_) => "GRAPH_UNKNOWN_NODE",
            GraphError::UnknownFlow(_) => "GRAPH_UNKNOWN_FLOW",
            GraphError::DuplicateId(_) => "GRAPH_DUPLICATE_ID",
            GraphError::AmbiguousTaskId { .. } => "GRAPH_AMBIGUOUS_TASK_ID",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Convenient Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Convert from graph error to boxed error
impl From<GraphError> for Box<dyn FlowoptError> {
    fn from(err: GraphError) -> Self {
        Box::new(err)
    }
}
