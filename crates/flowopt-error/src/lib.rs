// Flowopt Error Handling Framework
// Central location for error types, traits, and handling utilities

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

// Re-export common error handling tools for convenience
pub use thiserror;

// Module structure
mod macros;

// Include sub-modules
mod config;
mod graph;
mod refactor;
mod search;
mod simulation;

// Public exports
pub use config::{ConfigError, ConfigResult};
pub use graph::{GraphError, GraphResult};
pub use refactor::{RefactorError, RefactorResult};
pub use search::{SearchError, SearchResult};
pub use simulation::{SimulationError, SimulationResult};

/// Domain-specific error code tables
pub mod codes {
    pub use crate::config::codes as config;
    pub use crate::graph::codes as graph;
    pub use crate::refactor::codes as refactor;
    pub use crate::search::codes as search;
    pub use crate::simulation::codes as simulation;
}

/// Error domains representing the different components of the optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorDomain {
    Graph,
    Simulation,
    Refactor,
    Search,
    Config,
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDomain::Graph => write!(f, "graph"),
            ErrorDomain::Simulation => write!(f, "simulation"),
            ErrorDomain::Refactor => write!(f, "refactor"),
            ErrorDomain::Search => write!(f, "search"),
            ErrorDomain::Config => write!(f, "config"),
        }
    }
}

/// Error code structure for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ErrorCode(pub u32);

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Standard error message format for serialization
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorMessage {
    pub code: ErrorCode,
    pub domain: ErrorDomain,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Base trait for all errors raised by the optimizer.
pub trait FlowoptError: StdError + fmt::Debug + fmt::Display + Send + Sync + Any + 'static {
    /// Numeric code of this error within its domain.
    fn code(&self) -> ErrorCode;

    /// Component that raised the error.
    fn domain(&self) -> ErrorDomain;

    /// Returns a unique static string code for this error type.
    fn error_code(&self) -> &'static str;

    /// Whether the caller can skip the failing item and carry on.
    fn is_recoverable(&self) -> bool {
        false
    }

    /// Serializable report of this error.
    fn to_message(&self) -> ErrorMessage {
        ErrorMessage {
            code: self.code(),
            domain: self.domain(),
            message: self.to_string(),
            details: None,
        }
    }

    /// Returns this error as a `&dyn Any` to allow downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Shorthand for a boxed FlowoptError
pub type BoxError = Box<dyn FlowoptError>;

/// Standard Result type using BoxError
pub type Result<T> = std::result::Result<T, BoxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_code_display_is_zero_padded() {
        assert_eq!(ErrorCode(42).to_string(), "0042");
        assert_eq!(ErrorCode(1001).to_string(), "1001");
    }

    #[test]
    fn test_error_message_serializes_without_details() {
        let err = GraphError::MissingStart;
        let message = err.to_message();
        assert_eq!(message.domain, ErrorDomain::Graph);
        assert_eq!(message.code, codes::graph::MISSING_START);

        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["domain"], "Graph");
    }

    #[test]
    fn test_boxed_error_downcasts() {
        let boxed: BoxError = Box::new(RefactorError::unsupported("a2", "no pattern"));
        assert_eq!(boxed.domain(), ErrorDomain::Refactor);
        assert!(boxed.is_recoverable());
        let concrete = boxed.as_any().downcast_ref::<RefactorError>();
        assert!(matches!(concrete, Some(RefactorError::UnsupportedPattern { .. })));
    }

    #[test]
    fn test_nested_errors_keep_inner_message() {
        let err = SearchError::from(SimulationError::from(GraphError::MissingEnd));
        assert_eq!(err.domain(), ErrorDomain::Search);
        assert!(err.to_string().contains("no End node"));
    }
}
