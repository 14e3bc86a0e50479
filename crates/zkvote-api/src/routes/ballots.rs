//! # Ballot Administration and Queries
//!
//! - `POST /v1/ballots` creates and anchors a ballot (admin).
//! - `GET /v1/ballots` lists ballots in id order.
//! - `GET /v1/ballots/:id` returns one ballot with its derived status.
//! - `GET /v1/ballots/:id/pool` returns the ledger's privacy-pool root and
//!   accepted vote count.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use zkvote_ballot::{Ballot, BallotSpec, BallotStatus};
use zkvote_core::BallotId;
use zkvote_crypto::PoolRoot;

use crate::auth::AdminCaller;
use crate::error::{extract_json, AppError};
use crate::state::AppState;

/// A ballot together with its status at the time of the request.
#[derive(Debug, Serialize, Deserialize)]
pub struct BallotView {
    #[serde(flatten)]
    pub ballot: Ballot,
    pub status: BallotStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoolView {
    pub ballot_id: BallotId,
    pub merkle_root: PoolRoot,
    pub vote_count: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/ballots", get(list_ballots).post(create_ballot))
        .route("/v1/ballots/:id", get(get_ballot))
        .route("/v1/ballots/:id/pool", get(get_pool))
}

fn view(state: &AppState, ballot: Ballot) -> Result<BallotView, AppError> {
    let status = state.orchestrator.ballots().status(ballot.id)?;
    Ok(BallotView { ballot, status })
}

async fn create_ballot(
    _admin: AdminCaller,
    State(state): State<AppState>,
    body: Result<Json<BallotSpec>, JsonRejection>,
) -> Result<(StatusCode, Json<BallotView>), AppError> {
    let spec = extract_json(body)?;
    let ballot = state.orchestrator.create_ballot(spec).await?;
    Ok((StatusCode::CREATED, Json(view(&state, ballot)?)))
}

async fn list_ballots(State(state): State<AppState>) -> Result<Json<Vec<BallotView>>, AppError> {
    let ballots = state.orchestrator.ballots().list();
    let views = ballots
        .into_iter()
        .map(|b| view(&state, b))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(views))
}

async fn get_ballot(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<BallotView>, AppError> {
    let ballot = state.orchestrator.ballots().get(BallotId(id))?;
    Ok(Json(view(&state, ballot)?))
}

async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PoolView>, AppError> {
    let ballot_id = BallotId(id);
    let merkle_root = state.orchestrator.pool_root(ballot_id).await?;
    let vote_count = state.orchestrator.vote_count(ballot_id).await?;
    Ok(Json(PoolView {
        ballot_id,
        merkle_root,
        vote_count,
    }))
}
