use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::request::RequestStatus;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("operator {0} is off duty")]
    OperatorOffDuty(Uuid),

    #[error("store error during {operation} on {target}: {message}")]
    Store {
        operation: &'static str,
        target: String,
        message: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Attaches operation context to a store failure. A missing row becomes
    /// `NotFound`, a lost conditional write becomes `Conflict`, anything else
    /// is surfaced as a transient store error.
    pub fn from_store(operation: &'static str, target: impl ToString, err: StoreError) -> Self {
        let target = target.to_string();
        match err {
            StoreError::NotFound { table, id } => {
                AppError::NotFound(format!("{table} {id} not found"))
            }
            StoreError::Conflict { expected, actual } => AppError::Conflict(format!(
                "{operation} on {target} expected status {expected} but found {actual}"
            )),
            StoreError::Unavailable(message) => AppError::Store {
                operation,
                target,
                message,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::OperatorOffDuty(_) => StatusCode::CONFLICT,
            AppError::Store { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use crate::models::request::RequestStatus;
    use crate::store::StoreError;

    #[test]
    fn store_unavailable_keeps_operation_and_target() {
        let err = AppError::from_store(
            "assign",
            "req-1",
            StoreError::Unavailable("connection reset".to_string()),
        );

        let message = err.to_string();
        assert!(matches!(err, AppError::Store { .. }));
        assert!(message.contains("assign"));
        assert!(message.contains("req-1"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn lost_conditional_write_becomes_conflict() {
        let err = AppError::from_store(
            "assign",
            "req-1",
            StoreError::Conflict {
                expected: RequestStatus::Pending,
                actual: RequestStatus::Assigned,
            },
        );

        assert!(matches!(err, AppError::Conflict(_)));
    }
}
