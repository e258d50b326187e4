//! Error types for stile operations.
//!
//! This module defines [`StileError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `StileError` for domain-specific failures that need distinct handling
//! - Use `anyhow::Error` (via `StileError::Other`) for unexpected errors from
//!   external collaborators
//! - Version-parse failures are never errors: an absent or unparseable
//!   version resolves to the zero version (see [`crate::version`])
//! - Negotiation failures are surfaced once as a [`NegotiationOutcome`] and
//!   never retried
//!
//! [`NegotiationOutcome`]: crate::negotiation::NegotiationOutcome

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stile operations.
#[derive(Debug, Error)]
pub enum StileError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// The catalog directory is not configured and cannot be discovered.
    #[error("Could not determine the channel catalog location")]
    LocationUndeterminable,

    /// The named channel does not exist in the catalog.
    #[error("Channel '{name}' was not found in the catalog")]
    ChannelNotFound { name: String },

    /// None of the expected catalog API shapes matched.
    ///
    /// Distinct from a runtime failure: the catalog loaded fine, but exposes
    /// no shape this crate knows how to call for `operation`.
    #[error("Catalog exposes no supported shape for '{operation}'")]
    StructuralIncompatibility { operation: String },

    /// The catalog's backing store could not be written.
    #[error("Could not persist the catalog: {message}")]
    PersistFailure { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for stile operations.
pub type Result<T> = std::result::Result<T, StileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = StileError::ConfigNotFound {
            path: PathBuf::from("/foo/stile.yml"),
        };
        assert!(err.to_string().contains("/foo/stile.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = StileError::ConfigParseError {
            path: PathBuf::from("/stile.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/stile.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn channel_not_found_displays_name() {
        let err = StileError::ChannelNotFound {
            name: "neuro-tools".into(),
        };
        assert!(err.to_string().contains("neuro-tools"));
    }

    #[test]
    fn structural_incompatibility_displays_operation() {
        let err = StileError::StructuralIncompatibility {
            operation: "set activation".into(),
        };
        assert!(err.to_string().contains("set activation"));
    }

    #[test]
    fn persist_failure_displays_message() {
        let err = StileError::PersistFailure {
            message: "read-only file system".into(),
        };
        assert!(err.to_string().contains("read-only file system"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: StileError = io_err.into();
        assert!(matches!(err, StileError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(StileError::LocationUndeterminable)
        }
        assert!(returns_error().is_err());
    }
}
