//! # Vote Casting
//!
//! `POST /v1/ballots/:id/votes` runs the full casting pipeline and answers
//! 201 with a [`VoteReceipt`]. The request body carries the chosen option
//! and the voter's blinding secret. Both move into the orchestrator, which
//! zeroizes them once the vote is encrypted; neither is logged.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use zeroize::Zeroizing;
use zkvote_core::{BallotId, CredentialDigest, VoterHandle};
use zkvote_crypto::VoterSecret;
use zkvote_orchestrator::{CastVoteRequest, VoteReceipt};

use crate::error::{extract_json, AppError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CastVoteBody {
    pub voter_handle: VoterHandle,
    pub credential_digest: CredentialDigest,
    pub option: String,
    /// 64 lowercase hex characters.
    pub voter_secret: VoterSecret,
}

impl std::fmt::Debug for CastVoteBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastVoteBody")
            .field("voter", &self.voter_handle.short())
            .finish_non_exhaustive()
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/ballots/:id/votes", post(cast_vote))
}

async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<CastVoteBody>, JsonRejection>,
) -> Result<(StatusCode, Json<VoteReceipt>), AppError> {
    let body = extract_json(body)?;
    let request = CastVoteRequest {
        voter_handle: body.voter_handle,
        ballot_id: BallotId(id),
        credential_digest: body.credential_digest,
        option: Zeroizing::new(body.option),
        voter_secret: body.voter_secret,
    };

    match state.orchestrator.cast_vote(request).await {
        Ok(receipt) => {
            state.metrics.record_vote("confirmed");
            Ok((StatusCode::CREATED, Json(receipt)))
        }
        Err(e) => {
            state.metrics.record_vote(e.kind().as_str());
            Err(e.into())
        }
    }
}
