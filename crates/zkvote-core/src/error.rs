//! # Error Types — Vote Error Taxonomy
//!
//! Every failure a caller of the registry, ballot store, or orchestrator can
//! observe is a [`VoteError`] carrying a stable [`ErrorKind`]. Lower-level
//! errors (proof backend, ledger, attempt book) convert into `VoteError` at
//! the orchestrator boundary.
//!
//! ## Security Invariant
//!
//! Error messages never contain identities, chosen options, commitments,
//! proofs, ciphertexts, or secrets. Only handles, ballot ids and short
//! human-readable reasons appear.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable classification of a [`VoteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    IdentityInvalid,
    AlreadyRegistered,
    Ineligible,
    DuplicateVote,
    InvalidBallotSpec,
    NotFound,
    ProofGenerationFailed,
    ProofAggregationFailed,
    PoolVerificationFailed,
    LedgerUnavailable,
    Timeout,
}

impl ErrorKind {
    /// The stable wire code for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityInvalid => "IDENTITY_INVALID",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::Ineligible => "INELIGIBLE",
            Self::DuplicateVote => "DUPLICATE_VOTE",
            Self::InvalidBallotSpec => "INVALID_BALLOT_SPEC",
            Self::NotFound => "NOT_FOUND",
            Self::ProofGenerationFailed => "PROOF_GENERATION_FAILED",
            Self::ProofAggregationFailed => "PROOF_AGGREGATION_FAILED",
            Self::PoolVerificationFailed => "POOL_VERIFICATION_FAILED",
            Self::LedgerUnavailable => "LEDGER_UNAVAILABLE",
            Self::Timeout => "TIMEOUT",
        }
    }

    /// Whether a vote attempt failing with this kind frees the
    /// (voter, ballot) pair for a retry.
    ///
    /// `PoolVerificationFailed` is deliberately absent: the ledger may have
    /// recorded the vote, so the pair stays blocked.
    pub fn releases_marker(&self) -> bool {
        matches!(
            self,
            Self::ProofGenerationFailed
                | Self::ProofAggregationFailed
                | Self::LedgerUnavailable
                | Self::Timeout
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure surfaced by registration, ballot management, or vote casting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    /// Identity (or the key it is sealed under) was empty or malformed.
    #[error("invalid identity: {0}")]
    IdentityInvalid(String),

    /// The idempotency key was already used for a registration.
    #[error("already registered: {0}")]
    AlreadyRegistered(String),

    /// The voter may not vote on this ballot right now.
    #[error("ineligible: {0}")]
    Ineligible(String),

    /// A vote for this (voter, ballot) pair exists or is in progress.
    #[error("duplicate vote: {0}")]
    DuplicateVote(String),

    /// A ballot specification failed validation.
    #[error("invalid ballot specification: {0}")]
    InvalidBallotSpec(String),

    /// Unknown ballot, option, or voter.
    #[error("not found: {0}")]
    NotFound(String),

    /// Commitment, proof, or encryption could not be produced.
    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(String),

    /// The proof backend could not aggregate the proofs.
    #[error("proof aggregation failed: {0}")]
    ProofAggregationFailed(String),

    /// The ledger accepted the vote but its membership could not be verified.
    #[error("privacy pool verification failed: {0}")]
    PoolVerificationFailed(String),

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// A backend or ledger call exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl VoteError {
    /// The stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IdentityInvalid(_) => ErrorKind::IdentityInvalid,
            Self::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Self::Ineligible(_) => ErrorKind::Ineligible,
            Self::DuplicateVote(_) => ErrorKind::DuplicateVote,
            Self::InvalidBallotSpec(_) => ErrorKind::InvalidBallotSpec,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ProofGenerationFailed(_) => ErrorKind::ProofGenerationFailed,
            Self::ProofAggregationFailed(_) => ErrorKind::ProofAggregationFailed,
            Self::PoolVerificationFailed(_) => ErrorKind::PoolVerificationFailed,
            Self::LedgerUnavailable(_) => ErrorKind::LedgerUnavailable,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// The human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::IdentityInvalid(m)
            | Self::AlreadyRegistered(m)
            | Self::Ineligible(m)
            | Self::DuplicateVote(m)
            | Self::InvalidBallotSpec(m)
            | Self::NotFound(m)
            | Self::ProofGenerationFailed(m)
            | Self::ProofAggregationFailed(m)
            | Self::PoolVerificationFailed(m)
            | Self::LedgerUnavailable(m)
            | Self::Timeout(m) => m,
        }
    }
}
