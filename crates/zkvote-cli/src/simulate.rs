//! # Simulate Subcommand
//!
//! Runs a complete election in-process: one ballot, `--voters` registered
//! voters casting concurrently, round-robin over `--options`. Uses the mock
//! proof backend and in-memory ledger, so nothing leaves the process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::task::JoinSet;
use zeroize::Zeroizing;
use zkvote_api::config::ServiceConfig;
use zkvote_api::state::AppState;
use zkvote_ballot::BallotSpec;
use zkvote_core::{BallotId, Clock, SystemClock, Timestamp};
use zkvote_crypto::{IdentitySecret, PoolRoot, VoterSecret};
use zkvote_ledger::InMemoryLedger;
use zkvote_orchestrator::{CastVoteRequest, VoteOrchestrator, VoteReceipt};
use zkvote_zkp::MockProofBackend;

use crate::print_json;

/// Arguments for `zkvote simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of voters.
    #[arg(long, default_value_t = 10)]
    pub voters: usize,
    /// Comma-separated ballot options.
    #[arg(long, value_delimiter = ',', default_value = "Yes,No")]
    pub options: Vec<String>,
    /// Delay added to every backend and ledger call.
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub ballot_id: BallotId,
    pub voters: usize,
    pub receipts: Vec<VoteReceipt>,
    /// Error codes of votes that were not confirmed.
    pub failures: Vec<String>,
    pub merkle_root: PoolRoot,
    pub vote_count: u64,
}

pub async fn run_simulate(args: &SimulateArgs) -> Result<u8> {
    let latency = Duration::from_millis(args.latency_ms);
    let report = simulate(args.voters, &args.options, latency).await?;
    print_json(&report)?;
    Ok(if report.failures.is_empty() { 0 } else { 2 })
}

pub async fn simulate(
    voters: usize,
    options: &[String],
    latency: Duration,
) -> Result<SimulationReport> {
    if voters == 0 {
        bail!("--voters must be at least 1");
    }
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::with_parts(
        ServiceConfig::default(),
        Arc::new(MockProofBackend::new().with_latency(latency)),
        Arc::new(InMemoryLedger::new(clock.clone()).with_latency(latency)),
        clock,
    )
    .context("failed to build the in-process service")?;
    let orchestrator = state.orchestrator;

    let now = Timestamp::now();
    let ballot = orchestrator
        .create_ballot(BallotSpec {
            title: "Simulated election".to_string(),
            description: String::new(),
            open_at: now.plus_secs(-1),
            close_at: now.plus_secs(3600),
            options: options.to_vec(),
            eligibility_criteria: "simulation".to_string(),
            public_key: "simulation-ballot-key".to_string(),
        })
        .await
        .context("ballot creation failed")?;

    let mut tasks = JoinSet::new();
    for i in 0..voters {
        let orchestrator = Arc::clone(&orchestrator);
        let option = ballot.options[i % ballot.options.len()].clone();
        let ballot_id = ballot.id;
        tasks.spawn(async move { cast_one(&orchestrator, i, ballot_id, option).await });
    }

    let mut receipts = Vec::with_capacity(voters);
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined.context("voter task panicked")? {
            Ok(receipt) => receipts.push(receipt),
            Err(code) => failures.push(code),
        }
    }
    receipts.sort_by_key(|r| r.confirmed_at);

    let merkle_root = orchestrator.pool_root(ballot.id).await?;
    let vote_count = orchestrator.vote_count(ballot.id).await?;
    tracing::info!(
        ballot = %ballot.id,
        confirmed = receipts.len(),
        failed = failures.len(),
        "simulation finished"
    );

    Ok(SimulationReport {
        ballot_id: ballot.id,
        voters,
        receipts,
        failures,
        merkle_root,
        vote_count,
    })
}

/// Register voter `index` and cast `option`. Failures are reported by
/// error code.
async fn cast_one(
    orchestrator: &VoteOrchestrator,
    index: usize,
    ballot_id: BallotId,
    option: String,
) -> Result<VoteReceipt, String> {
    let identity = IdentitySecret::new(format!("simulated-voter-{index:05}"));
    let registered = orchestrator
        .registry()
        .register(identity, "simulation-registrar-key", None)
        .await
        .map_err(|e| e.kind().as_str().to_string())?;

    orchestrator
        .cast_vote(CastVoteRequest {
            voter_handle: registered.voter_handle,
            ballot_id,
            credential_digest: registered.credential_digest,
            option: Zeroizing::new(option),
            voter_secret: VoterSecret::generate(),
        })
        .await
        .map_err(|e| e.kind().as_str().to_string())
}
