//! Custom error types for the platform adaptation layer.
//!
//! This module provides a centralized error handling system using the
//! `thiserror` crate to define structured, typed errors with clear messages.

use std::io;
use thiserror::Error;

/// Primary error type for the platform layer, covering all possible error cases.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Errors from invalid or unsafe configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors writing tunables into the process environment.
    #[error("Environment error: {0}")]
    Environment(String),

    /// Errors from the underlying IO system.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed NIC hardware identifier.
    #[error("Malformed node GUID: {0}")]
    Guid(String),

    /// Inconsistent rail topology detected while sorting rails.
    #[error("Rail topology error: {0}")]
    RailTopology(String),

    /// A provider capability query or set call itself failed.
    #[error("Endpoint option {option} failed with provider error code {code}")]
    Capability { option: &'static str, code: i32 },

    /// An endpoint disagrees with the established ordering decision.
    #[error("Ordering requirement violated: {0}")]
    OrderingViolation(String),
}

/// Convenience type alias for Results with PlatformError.
pub type Result<T> = std::result::Result<T, PlatformError>;

impl PlatformError {
    /// Whether this error indicates a policy violation that must abort
    /// endpoint or process setup rather than a recoverable condition.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            PlatformError::Config(_)
                | PlatformError::OrderingViolation(_)
                | PlatformError::RailTopology(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_violation_classification() {
        assert!(PlatformError::Config("x".to_string()).is_policy_violation());
        assert!(PlatformError::OrderingViolation("x".to_string()).is_policy_violation());
        assert!(!PlatformError::Capability {
            option: "FI_OPT_MAX_MSG_SIZE",
            code: -22
        }
        .is_policy_violation());
    }

    #[test]
    fn test_error_display_includes_option_name() {
        let err = PlatformError::Capability {
            option: "FI_OPT_EFA_EMULATED_WRITE",
            code: -5,
        };
        assert!(err.to_string().contains("FI_OPT_EFA_EMULATED_WRITE"));
    }
}
