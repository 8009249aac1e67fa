use std::time::Duration;

use directory_sync_sdk::DirectorySyncError;
use thiserror::Error;

use crate::domain::ports::UpstreamError;
use crate::domain::repo::RepoError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Directory service timed out after {timeout:?}")]
    UpstreamTimeout { timeout: Duration },

    #[error("Directory service unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Unresolvable conflict on {key}: {message}")]
    ConflictUnresolvable { key: String, message: String },

    #[error("Record {external_id} skipped: {reason}")]
    RecordMappingSkipped { external_id: String, reason: String },

    #[error("Department not found: {key}")]
    DepartmentNotFound { key: String },

    #[error("Employee not found: {key}")]
    EmployeeNotFound { key: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },
}

impl DomainError {
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    pub fn conflict_unresolvable(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConflictUnresolvable {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn record_skipped(external_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RecordMappingSkipped {
            external_id: external_id.into(),
            reason: reason.into(),
        }
    }

    pub fn department_not_found(key: impl ToString) -> Self {
        Self::DepartmentNotFound {
            key: key.to_string(),
        }
    }

    pub fn employee_not_found(key: impl ToString) -> Self {
        Self::EmployeeNotFound {
            key: key.to_string(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Errors that abort a whole run rather than a single record.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout { .. } | Self::UpstreamUnavailable { .. }
        )
    }
}

impl From<UpstreamError> for DomainError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Timeout(timeout) => Self::UpstreamTimeout { timeout },
            UpstreamError::Unavailable(message) => Self::UpstreamUnavailable { message },
            UpstreamError::Decode(message) => Self::UpstreamUnavailable {
                message: format!("malformed response: {message}"),
            },
        }
    }
}

impl From<RepoError> for DomainError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::UniqueViolation(message) => Self::ConflictUnresolvable {
                key: "unique".to_owned(),
                message,
            },
            RepoError::StaleVersion { id } => Self::ConflictUnresolvable {
                key: id.to_string(),
                message: "record was modified concurrently".to_owned(),
            },
            RepoError::NotFound { id } => Self::Database {
                message: format!("record {id} disappeared"),
            },
            RepoError::Database(message) => Self::Database { message },
        }
    }
}

/// Convert domain errors to SDK errors for public API consumption.
impl From<DomainError> for DirectorySyncError {
    fn from(domain_error: DomainError) -> Self {
        match domain_error {
            DomainError::UpstreamTimeout { timeout } => {
                DirectorySyncError::upstream_timeout(timeout)
            }
            DomainError::UpstreamUnavailable { message } => {
                DirectorySyncError::upstream_unavailable(message)
            }
            DomainError::ConflictUnresolvable { key, message } => {
                DirectorySyncError::conflict(key, message)
            }
            DomainError::RecordMappingSkipped {
                external_id,
                reason,
            } => DirectorySyncError::validation(format!("{external_id}: {reason}")),
            DomainError::DepartmentNotFound { key } => {
                DirectorySyncError::not_found("Department", key)
            }
            DomainError::EmployeeNotFound { key } => DirectorySyncError::not_found("Employee", key),
            DomainError::Validation { field, message } => {
                DirectorySyncError::validation(format!("{field}: {message}"))
            }
            DomainError::Database { .. } => DirectorySyncError::internal(),
        }
    }
}
