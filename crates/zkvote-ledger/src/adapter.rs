//! # Ledger Adapter Interface
//!
//! Abstracts over the ledger backend. Production deployments implement it
//! against a real chain or replicated log; development and tests use
//! [`InMemoryLedger`](crate::InMemoryLedger).
//!
//! A refused submission is not an error: the ledger answered, and the
//! answer was no. [`LedgerError`] is reserved for the ledger not answering.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkvote_core::{BallotId, Timestamp};
use zkvote_crypto::{InclusionWitness, Nullifier, PoolRoot};
use zkvote_zkp::{AggregatedProof, Ciphertext, Commitment};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("{0} is not anchored on the ledger")]
    UnknownBallot(BallotId),

    #[error("{0} is already anchored on the ledger")]
    AlreadyAnchored(BallotId),

    #[error("invalid ballot anchor: {0}")]
    InvalidAnchor(String),

    #[error("ledger internal error: {0}")]
    Internal(String),
}

/// The voting window of a ballot as recorded on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotAnchor {
    pub ballot_id: BallotId,
    pub open_at: Timestamp,
    pub close_at: Timestamp,
}

/// Everything the ledger records for one vote.
#[derive(Debug, Clone)]
pub struct VoteSubmission {
    pub ballot_id: BallotId,
    pub ciphertext: Ciphertext,
    pub commitment: Commitment,
    pub proof: AggregatedProof,
    pub nullifier: Nullifier,
}

/// Why the ledger refused a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Submission arrived outside the anchored voting window.
    BallotNotOpen,
    /// A vote with this nullifier was already accepted.
    NullifierSpent,
    /// The ballot was never anchored.
    UnknownBallot,
    /// Empty proof or ciphertext.
    Malformed,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::BallotNotOpen => "ballot not open",
            Self::NullifierSpent => "nullifier already spent",
            Self::UnknownBallot => "ballot not anchored",
            Self::Malformed => "malformed submission",
        })
    }
}

/// The ledger's answer to [`LedgerAdapter::submit_vote`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub accepted: bool,
    /// Pool root after this submission (unchanged when refused).
    pub new_root: PoolRoot,
    /// Inclusion witness for the commitment against `new_root`.
    pub witness: Option<InclusionWitness>,
    pub rejection: Option<Rejection>,
}

impl SubmissionOutcome {
    pub fn accepted(new_root: PoolRoot, witness: InclusionWitness) -> Self {
        Self {
            accepted: true,
            new_root,
            witness: Some(witness),
            rejection: None,
        }
    }

    pub fn rejected(current_root: PoolRoot, rejection: Rejection) -> Self {
        Self {
            accepted: false,
            new_root: current_root,
            witness: None,
            rejection: Some(rejection),
        }
    }
}

/// Abstract interface to the vote ledger.
#[async_trait]
pub trait LedgerAdapter: Send + Sync {
    /// Anchor a ballot's voting window (issuer role).
    async fn create_ballot(&self, anchor: BallotAnchor) -> Result<BallotId, LedgerError>;

    async fn submit_vote(&self, submission: VoteSubmission)
        -> Result<SubmissionOutcome, LedgerError>;

    async fn privacy_pool_root(&self, ballot_id: BallotId) -> Result<PoolRoot, LedgerError>;

    /// Number of accepted votes for the ballot.
    async fn vote_count(&self, ballot_id: BallotId) -> Result<u64, LedgerError>;

    fn ledger_name(&self) -> &str;
}
