//! # In-Memory Ledger
//!
//! A single-process ledger for development, tests and the CLI simulator.
//! Each anchored ballot keeps its window, its spent nullifiers and its
//! privacy pool in one `DashMap` entry, so the window check, nullifier check
//! and pool append for a submission happen under one shard lock. A global
//! ordered log records every accepted vote.
//!
//! Time comes from the injected [`Clock`], so a ballot closing between the
//! orchestrator's eligibility check and submission is refused here.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use zkvote_core::{BallotId, Clock, ContentDigest, Timestamp};
use zkvote_crypto::{Nullifier, PoolAccumulator, PoolRoot};
use zkvote_zkp::Ciphertext;

use crate::adapter::{
    BallotAnchor, LedgerAdapter, LedgerError, Rejection, SubmissionOutcome, VoteSubmission,
};

/// One accepted vote in ledger order.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub sequence: u64,
    pub ballot_id: BallotId,
    pub commitment: ContentDigest,
    pub nullifier: Nullifier,
    pub ciphertext: Ciphertext,
    pub recorded_at: Timestamp,
}

struct BallotRecord {
    anchor: BallotAnchor,
    nullifiers: HashSet<Nullifier>,
    pool: PoolAccumulator,
}

pub struct InMemoryLedger {
    clock: Arc<dyn Clock>,
    ballots: DashMap<BallotId, BallotRecord>,
    log: Mutex<Vec<LedgerEntry>>,
    unavailable: AtomicBool,
    latency: Option<Duration>,
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("ballots", &self.ballots.len())
            .field("entries", &self.log.lock().len())
            .finish()
    }
}

impl InMemoryLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ballots: DashMap::new(),
            log: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
            latency: None,
        }
    }

    /// Sleep this long before handling each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate the ledger being unreachable.
    pub fn set_unavailable(&self, on: bool) {
        self.unavailable.store(on, Ordering::SeqCst);
    }

    /// Every accepted vote, in the order the ledger accepted them.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.log.lock().clone()
    }

    pub fn entries_for(&self, ballot_id: BallotId) -> Vec<LedgerEntry> {
        self.log
            .lock()
            .iter()
            .filter(|e| e.ballot_id == ballot_id)
            .cloned()
            .collect()
    }

    async fn enter(&self) -> Result<(), LedgerError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("in-memory ledger switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerAdapter for InMemoryLedger {
    async fn create_ballot(&self, anchor: BallotAnchor) -> Result<BallotId, LedgerError> {
        self.enter().await?;
        if anchor.open_at >= anchor.close_at {
            return Err(LedgerError::InvalidAnchor(
                "close_at must be strictly after open_at".to_string(),
            ));
        }
        match self.ballots.entry(anchor.ballot_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(LedgerError::AlreadyAnchored(anchor.ballot_id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(BallotRecord {
                    anchor,
                    nullifiers: HashSet::new(),
                    pool: PoolAccumulator::new(),
                });
                tracing::info!(ballot = %anchor.ballot_id, "ballot anchored");
                Ok(anchor.ballot_id)
            }
        }
    }

    async fn submit_vote(
        &self,
        submission: VoteSubmission,
    ) -> Result<SubmissionOutcome, LedgerError> {
        self.enter().await?;
        let ballot_id = submission.ballot_id;
        let Some(mut record) = self.ballots.get_mut(&ballot_id) else {
            return Ok(SubmissionOutcome::rejected(PoolRoot::EMPTY, Rejection::UnknownBallot));
        };

        let current_root = record.pool.root();
        let now = self.clock.now();
        if now < record.anchor.open_at || now >= record.anchor.close_at {
            tracing::warn!(ballot = %ballot_id, "submission outside voting window refused");
            return Ok(SubmissionOutcome::rejected(current_root, Rejection::BallotNotOpen));
        }
        if submission.proof.bytes.is_empty() || submission.ciphertext.body.is_empty() {
            return Ok(SubmissionOutcome::rejected(current_root, Rejection::Malformed));
        }
        if !record.nullifiers.insert(submission.nullifier) {
            tracing::warn!(ballot = %ballot_id, "spent nullifier refused");
            return Ok(SubmissionOutcome::rejected(current_root, Rejection::NullifierSpent));
        }

        let index = record.pool.append(&submission.commitment.digest);
        let witness = record
            .pool
            .witness(index)
            .map_err(|e| LedgerError::Internal(e.to_string()))?;
        let new_root = record.pool.root();

        let mut log = self.log.lock();
        let sequence = log.len() as u64;
        log.push(LedgerEntry {
            sequence,
            ballot_id,
            commitment: submission.commitment.digest,
            nullifier: submission.nullifier,
            ciphertext: submission.ciphertext,
            recorded_at: now,
        });
        drop(log);
        drop(record);

        tracing::info!(ballot = %ballot_id, sequence, "vote recorded");
        Ok(SubmissionOutcome::accepted(new_root, witness))
    }

    async fn privacy_pool_root(&self, ballot_id: BallotId) -> Result<PoolRoot, LedgerError> {
        self.enter().await?;
        self.ballots
            .get(&ballot_id)
            .map(|r| r.pool.root())
            .ok_or(LedgerError::UnknownBallot(ballot_id))
    }

    async fn vote_count(&self, ballot_id: BallotId) -> Result<u64, LedgerError> {
        self.enter().await?;
        self.ballots
            .get(&ballot_id)
            .map(|r| r.pool.len())
            .ok_or(LedgerError::UnknownBallot(ballot_id))
    }

    fn ledger_name(&self) -> &str {
        "in-memory"
    }
}
