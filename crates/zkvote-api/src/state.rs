//! # Application State
//!
//! Shared state for the Axum application, passed to every handler via the
//! `State` extractor. Cloning is cheap: everything sits behind an `Arc`.

use std::sync::Arc;

use zkvote_ballot::BallotStore;
use zkvote_core::{Clock, SystemClock};
use zkvote_ledger::{InMemoryLedger, LedgerAdapter};
use zkvote_orchestrator::VoteOrchestrator;
use zkvote_registry::VoterRegistry;
use zkvote_zkp::{MockProofBackend, ProofBackend};

use crate::config::ServiceConfig;
use crate::metrics::ApiMetrics;

#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Arc<VoteOrchestrator>,
    pub metrics: ApiMetrics,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Mock proof backend, in-memory ledger and the system clock.
    pub fn in_memory(config: ServiceConfig) -> Result<Self, prometheus::Error> {
        Self::in_memory_with_clock(config, Arc::new(SystemClock))
    }

    /// As [`in_memory`](Self::in_memory), reading time from `clock`.
    pub fn in_memory_with_clock(
        config: ServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, prometheus::Error> {
        let backend: Arc<dyn ProofBackend> = Arc::new(MockProofBackend::new());
        let ledger: Arc<dyn LedgerAdapter> = Arc::new(InMemoryLedger::new(clock.clone()));
        Self::with_parts(config, backend, ledger, clock)
    }

    /// Assemble the service around an arbitrary backend and ledger.
    pub fn with_parts(
        config: ServiceConfig,
        backend: Arc<dyn ProofBackend>,
        ledger: Arc<dyn LedgerAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, prometheus::Error> {
        let registry = Arc::new(VoterRegistry::new(backend.clone(), clock.clone()));
        let ballots = Arc::new(BallotStore::new(clock.clone()));
        let orchestrator = VoteOrchestrator::new(
            registry,
            ballots,
            backend,
            ledger,
            clock,
            config.orchestrator(),
        );
        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            metrics: ApiMetrics::new()?,
            config: Arc::new(config),
        })
    }
}
