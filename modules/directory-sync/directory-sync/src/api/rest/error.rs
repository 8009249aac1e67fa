//! REST error mapping for the directory sync module.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use modkit_errors::Problem;

use crate::domain::error::DomainError;

/// Seconds a client should wait before retrying after an upstream timeout.
const RETRY_AFTER_SECS: u64 = 30;

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        let trace_id = tracing::Span::current()
            .id()
            .map(|id| id.into_u64().to_string());

        let (status, code, title, detail) = match &e {
            DomainError::DepartmentNotFound { key } => (
                StatusCode::NOT_FOUND,
                "DIRECTORY_DEPARTMENT_NOT_FOUND",
                "Department not found",
                format!("No department {key}"),
            ),
            DomainError::EmployeeNotFound { key } => (
                StatusCode::NOT_FOUND,
                "DIRECTORY_EMPLOYEE_NOT_FOUND",
                "Employee not found",
                format!("No employee {key}"),
            ),
            DomainError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                "DIRECTORY_VALIDATION",
                "Validation error",
                format!("{field}: {message}"),
            ),
            DomainError::RecordMappingSkipped {
                external_id,
                reason,
            } => (
                StatusCode::BAD_REQUEST,
                "DIRECTORY_RECORD_SKIPPED",
                "Record skipped",
                format!("{external_id}: {reason}"),
            ),
            DomainError::ConflictUnresolvable { key, message } => (
                StatusCode::CONFLICT,
                "DIRECTORY_CONFLICT",
                "Conflict",
                format!("{key}: {message}"),
            ),
            DomainError::UpstreamTimeout { timeout } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DIRECTORY_UPSTREAM_TIMEOUT",
                "Directory service timeout",
                format!("The directory service did not answer within {timeout:?}"),
            ),
            DomainError::UpstreamUnavailable { message } => (
                StatusCode::BAD_GATEWAY,
                "DIRECTORY_UPSTREAM_UNAVAILABLE",
                "Directory service unavailable",
                message.clone(),
            ),
            DomainError::Database { .. } => {
                tracing::error!(error = ?e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DIRECTORY_INTERNAL",
                    "Internal Server Error",
                    "An internal error occurred".to_owned(),
                )
            }
        };

        let mut problem = Problem::new(status, title, detail)
            .with_type(format!("https://errors.hr-platform.local/{code}"))
            .with_code(code);

        if let Some(id) = trace_id {
            problem = problem.with_trace_id(id);
        }

        problem
    }
}

/// Error side of every handler: a [`Problem`] plus the `Retry-After` hint
/// sent with upstream timeouts.
#[derive(Debug)]
pub struct ApiError {
    pub problem: Problem,
    pub retry_after: Option<u64>,
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let retry_after =
            matches!(e, DomainError::UpstreamTimeout { .. }).then_some(RETRY_AFTER_SECS);
        Self {
            problem: Problem::from(e),
            retry_after,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut resp = self.problem.into_response();
        if let Some(secs) = self.retry_after {
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        resp
    }
}
