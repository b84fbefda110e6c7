// Refactoring error types
// Raised by the rewrite patterns and the simplifier

use std::any::Any;

use thiserror::Error;

use crate::{ErrorCode, ErrorDomain, FlowoptError, GraphError};

/// Refactoring error codes
pub mod codes {
    use crate::ErrorCode;

    // Refactoring error codes start with 3000
    pub const UNSUPPORTED_PATTERN: ErrorCode = ErrorCode(3001);
    pub const UNKNOWN_TASK: ErrorCode = ErrorCode(3002);
    pub const NOT_AN_ACTIVITY: ErrorCode = ErrorCode(3003);
    pub const UNBALANCED_REGION: ErrorCode = ErrorCode(3004);
    pub const GRAPH_ERROR: ErrorCode = ErrorCode(3005);
}

/// Refactoring-specific error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefactorError {
    /// No rewrite pattern covers the context of the task
    #[error("No refactoring pattern applies to {task}: {reason}")]
    UnsupportedPattern { task: String, reason: String },

    /// The task is not part of the graph
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// The node exists but is not an activity
    #[error("Node {0} is not an activity")]
    NotAnActivity(String),

    /// Split/join pairing could not be resolved
    #[error("No matching merge for split {0}")]
    UnbalancedRegion(String),

    /// Graph-level failure while rewriting
    #[error("{0}")]
    Graph(#[from] GraphError),
}

impl RefactorError {
    /// Create an unsupported pattern error
    pub fn unsupported(task: impl Into<String>, reason: impl Into<String>) -> Self {
        RefactorError::UnsupportedPattern {
            task: task.into(),
            reason: reason.into(),
        }
    }
}

impl FlowoptError for RefactorError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            RefactorError::UnsupportedPattern { .. } => UNSUPPORTED_PATTERN,
            RefactorError::UnknownTask(_) => UNKNOWN_TASK,
            RefactorError::NotAnActivity(_) => NOT_AN_ACTIVITY,
            RefactorError::UnbalancedRegion(_) => UNBALANCED_REGION,
            RefactorError::Graph(_) => GRAPH_ERROR,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Refactor
    }

    fn error_code(&self) -> &'static str {
        match self {
            RefactorError::UnsupportedPattern { .. } => "REFACTOR_UNSUPPORTED_PATTERN",
            RefactorError::UnknownTask(_) => "REFACTOR_UNKNOWN_TASK",
            RefactorError::NotAnActivity(_) => "REFACTOR_NOT_AN_ACTIVITY",
            RefactorError::UnbalancedRegion(_) => "REFACTOR_UNBALANCED_REGION",
            RefactorError::Graph(_) => "REFACTOR_GRAPH_ERROR",
        }
    }

    // A declined rewrite only prunes one branch of the search.
    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RefactorError::UnsupportedPattern { .. } | RefactorError::UnbalancedRegion(_)
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Convenient Result type for refactoring operations
pub type RefactorResult<T> = Result<T, RefactorError>;

impl From<RefactorError> for Box<dyn FlowoptError> {
    fn from(err: RefactorError) -> Self {
        Box::new(err)
    }
}
