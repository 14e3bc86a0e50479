//! # Vote Nullifiers
//!
//! A nullifier is a deterministic tag for a (credential, ballot) pair.
//! The ledger refuses a second vote carrying a nullifier it has already
//! seen, which makes it the final authority against double voting even when
//! two orchestrator attempts for the same pair race to submission.
//!
//! `nullifier = SHA-256("zkvote/nullifier/v1" || credential_digest || ballot_id_be64)`
//!
//! The voter handle is public (it names the voter in the API), so it must
//! not feed the nullifier. The credential digest is known only to the voter
//! and to the sealed registry record; without it a ledger entry cannot be
//! traced back to a handle.

use serde::{Deserialize, Serialize};
use zkvote_core::{BallotId, ContentDigest, CredentialDigest, Sha256Accumulator};

const DOMAIN_TAG: &[u8] = b"zkvote/nullifier/v1";

/// Per-(voter, ballot) double-vote tag submitted with every vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nullifier(pub ContentDigest);

impl std::fmt::Display for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nullifier:{}", self.0)
    }
}

/// Derive the nullifier for the holder of `credential` voting on `ballot`.
pub fn derive_nullifier(credential: &CredentialDigest, ballot: BallotId) -> Nullifier {
    let mut acc = Sha256Accumulator::new();
    acc.update(DOMAIN_TAG);
    acc.update(credential.as_bytes());
    acc.update(&ballot.as_u64().to_be_bytes());
    Nullifier(acc.finalize())
}
