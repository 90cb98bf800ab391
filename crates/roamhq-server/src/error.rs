//! HTTP error types for the RoamHQ console API.
//!
//! Maps domain errors from `roamhq-core` and the ECS gateway into HTTP
//! responses. Every error produces a JSON body with a machine-readable
//! `error` field and a human-readable `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use roamhq_core::error::{DecodeError, EncodeError};

use crate::ecs::EcsError;

/// Application-level error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Login failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A token was presented but is not valid for this deployment.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Client sent invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The route needs a credential or secret this deployment lacks.
    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    /// The ECS API rejected or failed a call.
    #[error("ecs error: {0}")]
    Ecs(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotConfigured(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_configured",
                what.to_owned(),
            ),
            Self::Ecs(msg) => {
                tracing::warn!(error = %msg, "ecs request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "ecs_error", msg)
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<EncodeError> for AppError {
    fn from(err: EncodeError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        // The caller only learns that the token is bad, never why.
        tracing::debug!(reason = %err, "rejected DNS client token");
        Self::Forbidden("invalid token".to_owned())
    }
}

impl From<EcsError> for AppError {
    fn from(err: EcsError) -> Self {
        match err {
            EcsError::InvalidRequest { .. } => Self::BadRequest(err.to_string()),
            EcsError::List { .. } | EcsError::Launch { .. } => Self::Ecs(err.to_string()),
        }
    }
}
