// Configuration error types

use std::any::Any;

use thiserror::Error;

use crate::{ErrorCode, ErrorDomain, FlowoptError};

/// Configuration error codes
pub mod codes {
    use crate::ErrorCode;

    // Configuration error codes start with 5000
    pub const INVALID_VALUE: ErrorCode = ErrorCode(5001);
    pub const PARSE_FAILED: ErrorCode = ErrorCode(5002);
    pub const UNKNOWN_STRATEGY: ErrorCode = ErrorCode(5003);
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field holds a value outside its accepted range
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// The configuration text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Unrecognised exploration strategy name
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl FlowoptError for ConfigError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            ConfigError::InvalidValue { .. } => INVALID_VALUE,
            ConfigError::ParseFailed(_) => PARSE_FAILED,
            ConfigError::UnknownStrategy(_) => UNKNOWN_STRATEGY,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Config
    }

    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::ParseFailed(_) => "CONFIG_PARSE_FAILED",
            ConfigError::UnknownStrategy(_) => "CONFIG_UNKNOWN_STRATEGY",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Convenient Result type for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for Box<dyn FlowoptError> {
    fn from(err: ConfigError) -> Self {
        Box::new(err)
    }
}
