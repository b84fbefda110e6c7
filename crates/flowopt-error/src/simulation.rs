// Simulation error types
// These errors are raised by the token simulator and the analyzer

use std::any::Any;

use thiserror::Error;

use crate::{ConfigError, ErrorCode, ErrorDomain, FlowoptError, GraphError};

/// Simulation error codes
pub mod codes {
    use crate::ErrorCode;

    // Simulation error codes start with 2000
    pub const MALFORMED_GRAPH: ErrorCode = ErrorCode(2001);
    pub const UNSUPPORTED_GATEWAY: ErrorCode = ErrorCode(2002);
    pub const DEADLOCK: ErrorCode = ErrorCode(2003);
    pub const TICK_LIMIT: ErrorCode = ErrorCode(2004);
    pub const INVALID_CONFIG: ErrorCode = ErrorCode(2005);
}

/// Simulation-specific error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// The graph failed validation before the run started
    #[error("{0}")]
    Graph(#[from] GraphError),

    /// A gateway kind without token semantics was reached
    #[error("Gateway {node} has kind {kind}, which cannot be simulated")]
    UnsupportedGateway { node: String, kind: String },

    /// Every pending token waits on something that can never happen
    #[error("Simulation deadlocked at time {time} with {pending} pending token(s)")]
    Deadlock { time: u64, pending: usize },

    /// The configured tick limit was exhausted
    #[error("Simulation exceeded the limit of {limit} ticks")]
    TickLimitExceeded { limit: u64 },

    /// Rejected simulation configuration
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl FlowoptError for SimulationError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            SimulationError::Graph(_) => MALFORMED_GRAPH,
            SimulationError::UnsupportedGateway { .. } => UNSUPPORTED_GATEWAY,
            SimulationError::Deadlock { .. } => DEADLOCK,
            SimulationError::TickLimitExceeded { .. } => TICK_LIMIT,
            SimulationError::Config(_) => INVALID_CONFIG,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Simulation
    }

    fn error_code(&self) -> &'static str {
        match self {
            SimulationError::Graph(_) => "SIMULATION_MALFORMED_GRAPH",
            SimulationError::UnsupportedGateway { .. } => "SIMULATION_UNSUPPORTED_GATEWAY",
            SimulationError::Deadlock { .. } => "SIMULATION_DEADLOCK",
            SimulationError::TickLimitExceeded { .. } => "SIMULATION_TICK_LIMIT",
            SimulationError::Config(_) => "SIMULATION_INVALID_CONFIG",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Convenient Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

impl From<SimulationError> for Box<dyn FlowoptError> {
    fn from(err: SimulationError) -> Self {
        Box::new(err)
    }
}
