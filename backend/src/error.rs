//! Application error handling
//!
//! [`ApiError`] is the one error type handlers return; its `IntoResponse`
//! impl is the boundary that turns it into the JSON error envelope.

use crate::config::AppConfig;
use crate::repositories::StoreError;
use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bandsync_shared::types::{ErrorDetail, ErrorResponse};
use bandsync_shared::validation::ValidationError;
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Duplicate unique field. Reported as 400, like other client mistakes.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: None,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation {
            message: err.user_message(),
            field: Some(err.field),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        ApiError::validation(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) if constraint.contains("email") => {
                ApiError::Conflict("User with this email already exists".to_string())
            }
            StoreError::UniqueViolation(constraint) => {
                ApiError::Conflict(format!("A {} with that value already exists", constraint))
            }
            StoreError::NotFound => ApiError::NotFound("Record not found".to_string()),
            StoreError::Database(err) => ApiError::Database(err),
        }
    }
}

pub const RATE_LIMITED: &str = "Too many requests from this IP, please try again later.";

impl ApiError {
    /// Render the error envelope; `production` hides internal detail
    pub fn render(self, production: bool) -> Response {
        let retry_after = match &self {
            ApiError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let (status, code, message, field, detail) = match self {
            ApiError::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, field, None)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None, None),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None, None)
            }
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, "CONFLICT", msg, None, None),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Request body is too large".to_string(),
                None,
                None,
            ),
            ApiError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                RATE_LIMITED.to_string(),
                None,
                None,
            ),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                    debug_detail(&err, production),
                )
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                    debug_detail(&err, production),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
                detail,
            },
        });

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.render(AppConfig::is_production())
    }
}

/// Full error chain, exposed only outside production
fn debug_detail(err: &dyn std::fmt::Debug, production: bool) -> Option<String> {
    if production {
        None
    } else {
        Some(format!("{:?}", err))
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
