//! # zkvote-api — HTTP Service
//!
//! Axum front end over the [`VoteOrchestrator`](zkvote_orchestrator::VoteOrchestrator).
//!
//! ## API Surface
//!
//! | Route | Auth | Module |
//! |---|---|---|
//! | `POST /v1/voters` | none | [`routes::voters`] |
//! | `GET /v1/voters/:handle` | none | [`routes::voters`] |
//! | `DELETE /v1/voters/:handle` | admin | [`routes::voters`] |
//! | `POST /v1/ballots` | admin | [`routes::ballots`] |
//! | `GET /v1/ballots`, `GET /v1/ballots/:id` | none | [`routes::ballots`] |
//! | `GET /v1/ballots/:id/pool` | none | [`routes::ballots`] |
//! | `POST /v1/ballots/:id/votes` | none | [`routes::votes`] |
//! | `GET /health/liveness`, `GET /health/readiness` | none | here |
//! | `GET /metrics` | none | here |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler (AdminCaller extractor on admin routes)
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
///
/// Health probes and `/metrics` sit outside the tracing and metrics layers
/// so that scrapes do not count themselves.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::voters::router())
        .merge(routes::ballots::router())
        .merge(routes::votes::router())
        .layer(from_fn(metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(state.metrics.clone()))
        .with_state(state.clone());

    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state);

    Router::new().merge(ops).merge(api)
}

async fn liveness() -> &'static str {
    "ok"
}

/// The in-memory ledger and mock backend need no warm-up.
async fn readiness() -> &'static str {
    "ready"
}

async fn prometheus_metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics.gather_and_encode() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => {
            tracing::error!(error = %e, "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}
