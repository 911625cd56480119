//! API error type.
//!
//! Maps registry and verifier errors to HTTP status codes with a JSON body
//! `{ "error": { "code": ..., "message": ... } }`. Infrastructure details are
//! logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vouch_core::ErrorKind;
use vouch_registry::RegistryError;
use vouch_verifier::VerifierError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. "NOT_FOUND".
    pub code: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing caller identity header")]
    MissingCaller,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Verifier(#[from] VerifierError),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingCaller => (StatusCode::UNAUTHORIZED, "MISSING_CALLER"),
            Self::Registry(e) => kind_status(e.kind()),
            Self::Verifier(e) => kind_status(e.kind()),
            Self::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

fn kind_status(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::InvalidArgument => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
        ErrorKind::AlreadyExists => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Unauthorized => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
        ErrorKind::StateError => (StatusCode::CONFLICT, "STATE_ERROR"),
        ErrorKind::InfrastructureError => (StatusCode::SERVICE_UNAVAILABLE, "INFRASTRUCTURE_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            status
                .canonical_reason()
                .unwrap_or("server error")
                .to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
