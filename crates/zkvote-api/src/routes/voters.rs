//! # Voter Registration
//!
//! - `POST /v1/voters` registers a voter. An optional `Idempotency-Key`
//!   header makes retries safe: a repeated key answers 409.
//! - `GET /v1/voters/:handle` reports whether a handle is registered.
//! - `DELETE /v1/voters/:handle` revokes a credential (admin).
//!
//! The registration response is the only place the credential digest is
//! ever returned.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use zkvote_core::{IdempotencyKey, Timestamp, VoteError, VoterHandle};
use zkvote_crypto::IdentitySecret;
use zkvote_registry::RegistrationResult;

use crate::auth::AdminCaller;
use crate::error::{extract_json, AppError};
use crate::state::AppState;

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

#[derive(Debug, Deserialize)]
pub struct RegisterVoterRequest {
    pub identity: IdentitySecret,
    pub public_key: String,
}

/// Registration status of a handle. Never carries the credential.
#[derive(Debug, Serialize, Deserialize)]
pub struct VoterStatusView {
    pub voter_handle: VoterHandle,
    pub registered: bool,
    pub registered_at: Timestamp,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/voters", post(register_voter))
        .route("/v1/voters/:handle", get(get_voter).delete(revoke_voter))
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<IdempotencyKey>, AppError> {
    match headers.get(IDEMPOTENCY_HEADER) {
        None => Ok(None),
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| AppError::BadRequest("idempotency key must be ASCII".to_string()))?;
            Ok(Some(IdempotencyKey::parse(raw)?))
        }
    }
}

async fn register_voter(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RegisterVoterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistrationResult>), AppError> {
    let req = extract_json(body)?;
    let key = idempotency_key(&headers)?;

    let result = state
        .orchestrator
        .registry()
        .register(req.identity, &req.public_key, key)
        .await;
    match result {
        Ok(registered) => {
            state.metrics.record_registration("registered");
            Ok((StatusCode::CREATED, Json(registered)))
        }
        Err(e) => {
            state.metrics.record_registration(e.kind().as_str());
            Err(e.into())
        }
    }
}

async fn get_voter(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<VoterStatusView>, AppError> {
    let handle = VoterHandle::parse(&handle)?;
    let credential = state
        .orchestrator
        .registry()
        .credential(&handle)
        .ok_or_else(|| VoteError::NotFound("voter is not registered".to_string()))?;
    Ok(Json(VoterStatusView {
        voter_handle: credential.voter_handle,
        registered: true,
        registered_at: credential.registered_at,
    }))
}

async fn revoke_voter(
    _admin: AdminCaller,
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<StatusCode, AppError> {
    let handle = VoterHandle::parse(&handle)?;
    if state.orchestrator.registry().revoke(&handle) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(VoteError::NotFound("voter is not registered".to_string()).into())
    }
}
