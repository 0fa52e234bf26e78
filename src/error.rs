//! Unified error handling for the flight-trace library.
//!
//! Ordinary trace behaviour (throttled fixes, time regressions, queries on an
//! empty trace) is never reported as an error. Errors are reserved for
//! caller bugs such as an unusable store configuration.

use thiserror::Error;

/// Unified error type for flight-trace operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraceError {
    /// Store configuration violates a precondition
    #[error("Invalid trace configuration: {message}")]
    InvalidConfig { message: String },
    /// Configuration could not be parsed
    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },
}

impl From<serde_json::Error> for TraceError {
    fn from(err: serde_json::Error) -> Self {
        TraceError::ConfigParse {
            message: err.to_string(),
        }
    }
}

/// Result type alias for flight-trace operations.
pub type Result<T> = std::result::Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TraceError::InvalidConfig {
            message: "max_points is 3, minimum 4 required".to_string(),
        };
        assert!(err.to_string().contains("Invalid trace configuration"));
        assert!(err.to_string().contains("minimum 4"));
    }

    #[test]
    fn test_from_json_error() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: TraceError = parse.unwrap_err().into();
        assert!(matches!(err, TraceError::ConfigParse { .. }));
    }
}
