//! Public error types for the `directory_sync` module.
//!
//! These errors are safe to expose to other modules and consumers.

use std::time::Duration;

use thiserror::Error;

/// Errors that can be returned by the `DirectorySyncApi`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectorySyncError {
    /// The requested department or employee does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The directory service did not answer within the configured timeout.
    #[error("Directory service timed out after {timeout:?}")]
    UpstreamTimeout { timeout: Duration },

    /// Any other failure talking to the directory service.
    #[error("Directory service unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// A uniqueness conflict that could not be merged.
    #[error("Conflict on {key}: {message}")]
    Conflict { key: String, message: String },

    /// Validation error with the provided data.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// An internal error occurred.
    #[error("Internal error")]
    Internal,
}

impl DirectorySyncError {
    /// Create a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create an `UpstreamTimeout` error.
    #[must_use]
    pub fn upstream_timeout(timeout: Duration) -> Self {
        Self::UpstreamTimeout { timeout }
    }

    /// Create an `UpstreamUnavailable` error.
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    /// Create a `Conflict` error.
    pub fn conflict(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a `Validation` error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an `Internal` error.
    #[must_use]
    pub fn internal() -> Self {
        Self::Internal
    }

    /// Whether the caller may retry the same request later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout { .. } | Self::UpstreamUnavailable { .. }
        )
    }
}
