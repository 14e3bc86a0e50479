//! # Vote Requests and Receipts
//!
//! ## Security Invariant
//!
//! A [`VoteReceipt`] proves inclusion, not content: it carries the ballot,
//! the commitment digest and the pool root the commitment was verified
//! against. It never carries the chosen option or anything derived from
//! the voter's identity.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;
use zkvote_core::{BallotId, ContentDigest, CredentialDigest, Timestamp, VoterHandle};
use zkvote_crypto::{PoolRoot, VoterSecret};

/// Input to [`VoteOrchestrator::cast_vote`](crate::VoteOrchestrator::cast_vote).
pub struct CastVoteRequest {
    pub voter_handle: VoterHandle,
    pub ballot_id: BallotId,
    /// The digest returned at registration.
    pub credential_digest: CredentialDigest,
    /// Wiped when the orchestrator has encrypted it.
    pub option: Zeroizing<String>,
    /// Blinding secret for the commitment.
    pub voter_secret: VoterSecret,
}

impl std::fmt::Debug for CastVoteRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastVoteRequest")
            .field("voter", &self.voter_handle.short())
            .field("ballot_id", &self.ballot_id)
            .finish_non_exhaustive()
    }
}

/// Proof that a vote was recorded and found in the privacy pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub ballot_id: BallotId,
    pub commitment_digest: ContentDigest,
    pub merkle_root: PoolRoot,
    pub confirmed_at: Timestamp,
}
