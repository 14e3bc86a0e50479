//! # Application Error
//!
//! Maps domain errors to structured HTTP responses:
//!
//! ```json
//! { "error": { "code": "DUPLICATE_VOTE", "message": "..." } }
//! ```
//!
//! Domain errors keep their stable `ErrorKind` code. Messages never carry
//! identities, options, or cryptographic material.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkvote_core::{ErrorKind, IdentifierError, VoteError};

/// Top-level error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code (`NOT_FOUND`, `DUPLICATE_VOTE`, ...).
    pub code: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// A voting-domain failure.
    #[error(transparent)]
    Vote(#[from] VoteError),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or wrong bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Admin routes disabled (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Vote(e) => (vote_status(e.kind()), e.kind().as_str()),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

fn vote_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::IdentityInvalid | ErrorKind::InvalidBallotSpec => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::AlreadyRegistered | ErrorKind::DuplicateVote => StatusCode::CONFLICT,
        ErrorKind::Ineligible => StatusCode::FORBIDDEN,
        ErrorKind::ProofGenerationFailed | ErrorKind::ProofAggregationFailed => {
            StatusCode::BAD_GATEWAY
        }
        ErrorKind::LedgerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::PoolVerificationFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Vote(e) => e.message().to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Vote(e) if e.kind() == ErrorKind::PoolVerificationFailed => {
                tracing::error!(code, "vote accepted by ledger but not verified in pool")
            }
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<IdentifierError> for AppError {
    fn from(err: IdentifierError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Unwrap a JSON body, mapping deserialization failures to `BadRequest`.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}
