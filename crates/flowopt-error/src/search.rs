// Search error types
// Raised by the exploration loop

use std::any::Any;

use thiserror::Error;

use crate::{ConfigError, ErrorCode, ErrorDomain, FlowoptError, GraphError, RefactorError, SimulationError};

/// Search error codes
pub mod codes {
    use crate::ErrorCode;

    // Search error codes start with 4000
    pub const MALFORMED_INPUT: ErrorCode = ErrorCode(4001);
    pub const SIMULATION_FAILED: ErrorCode = ErrorCode(4002);
    pub const INVALID_CONFIG: ErrorCode = ErrorCode(4003);
    pub const REFACTOR_FAILED: ErrorCode = ErrorCode(4004);
}

/// Search-specific error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The input graph is malformed
    #[error("Input graph rejected: {0}")]
    Graph(#[from] GraphError),

    /// A simulation run failed
    #[error("Simulation failed: {0}")]
    Simulation(#[from] SimulationError),

    /// Rejected search configuration
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A rewrite failed for a reason other than an unsupported pattern
    #[error("Refactoring failed: {0}")]
    Refactor(#[from] RefactorError),
}

impl FlowoptError for SearchError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            SearchError::Graph(_) => MALFORMED_INPUT,
            SearchError::Simulation(_) => SIMULATION_FAILED,
            SearchError::Config(_) => INVALID_CONFIG,
            SearchError::Refactor(_) => REFACTOR_FAILED,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Search
    }

    fn error_code(&self) -> &'static str {
        match self {
            SearchError::Graph(_) => "SEARCH_MALFORMED_INPUT",
            SearchError::Simulation(_) => "SEARCH_SIMULATION_FAILED",
            SearchError::Config(_) => "SEARCH_INVALID_CONFIG",
            SearchError::Refactor(_) => "SEARCH_REFACTOR_FAILED",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Convenient Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

impl From<SearchError> for Box<dyn FlowoptError> {
    fn from(err: SearchError) -> Self {
        Box::new(err)
    }
}
