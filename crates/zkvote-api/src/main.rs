//! # zkvote-api — Binary Entry Point
//!
//! Starts the HTTP service on `ZKVOTE_PORT` and a background sweeper that
//! rejects abandoned vote attempts every `ZKVOTE_SWEEP_INTERVAL_SECS`.

use std::sync::Arc;

use anyhow::Context;
use zkvote_api::config::ServiceConfig;
use zkvote_api::state::AppState;
use zkvote_orchestrator::VoteOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "configuration loaded");
    if config.admin_token.is_none() {
        tracing::warn!("ZKVOTE_ADMIN_TOKEN not set; ballot creation and revocation are disabled");
    }
    tracing::warn!("using the mock proof backend: votes are NOT private");

    let port = config.port;
    let interval = config.sweep_interval();
    let state = AppState::in_memory(config).context("failed to register metrics")?;

    tokio::spawn(sweep_forever(state.orchestrator.clone(), interval));

    let app = zkvote_api::app(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("zkvote API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn sweep_forever(orchestrator: Arc<VoteOrchestrator>, period: std::time::Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        orchestrator.sweep_abandoned();
    }
}
