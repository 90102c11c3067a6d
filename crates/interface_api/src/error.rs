//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use domain_reconciliation::EngineError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid request body")]
    InvalidFields(Vec<String>),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) | ApiError::InvalidFields(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) | ApiError::InvalidFields(_) => "validation_error",
            ApiError::Unavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// Shorthand for a missing request field
    pub fn missing(field: &str) -> Self {
        ApiError::Validation(format!("`{field}` is required"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
        }

        let (message, details) = match &self {
            ApiError::InvalidFields(fields) => (self.to_string(), Some(fields.clone())),
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::Unavailable(msg)
            | ApiError::Internal(msg) => (msg.clone(), None),
        };

        let body = ErrorResponse {
            error: self.error_type().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::NotFound { .. } => ApiError::NotFound(message),
            EngineError::IllegalTransition { .. } | EngineError::InvalidState(_) => {
                ApiError::Conflict(message)
            }
            EngineError::InvalidAllocation(_) | EngineError::Validation(_) => {
                ApiError::Validation(message)
            }
            EngineError::StoreUnavailable(_) => ApiError::Unavailable(message),
            EngineError::Store(_) => ApiError::Internal(message),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{field}: {message}"),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::InvalidFields(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PortError;

    #[test]
    fn test_engine_errors_map_to_status_codes() {
        let cases = [
            (EngineError::not_found("Claim", "c-1"), StatusCode::NOT_FOUND),
            (
                EngineError::IllegalTransition {
                    entity: "claim",
                    from: "pending".into(),
                    to: "settled".into(),
                },
                StatusCode::CONFLICT,
            ),
            (EngineError::InvalidAllocation("over".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (EngineError::InvalidState("decided".into()), StatusCode::CONFLICT),
            (EngineError::Validation("empty".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (EngineError::StoreUnavailable("busy".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                EngineError::Store(PortError::internal("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_missing_field_is_unprocessable() {
        let err = ApiError::missing("amount");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().contains("amount"));
    }
}
