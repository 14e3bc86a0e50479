//! # Proof Backend Trait
//!
//! The abstract interface the vote orchestrator and credential issuer use
//! for every cryptographic artifact. Implementations may be a real ZK proof
//! system, a remote proving service, or the in-process mock.
//!
//! ## Security Invariant
//!
//! The trait requires `Send + Sync` and is object-safe so a single
//! `Arc<dyn ProofBackend>` can serve concurrent vote attempts. Every method
//! fails closed: an error is never interpreted as success.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;
use zkvote_core::{ContentDigest, VoterHandle};
use zkvote_crypto::{InclusionWitness, PoolRoot, VoterSecret};

/// Failure inside the proof backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached or is overloaded.
    #[error("proof backend unavailable: {0}")]
    Unavailable(String),

    /// The inputs do not admit a proof (e.g. option not on the ballot).
    #[error("proof backend rejected request: {0}")]
    Rejected(String),

    /// Ciphertext failed authentication or could not be decoded.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Any other backend fault.
    #[error("proof backend internal error: {0}")]
    Internal(String),
}

/// A binding, hiding commitment to a chosen option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub digest: ContentDigest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    Eligibility,
    Vote,
}

/// An individual proof produced by [`ProofBackend::prove`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub kind: ProofKind,
    pub bytes: Vec<u8>,
}

/// A single proof standing in for several component proofs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedProof {
    pub components: Vec<ProofKind>,
    pub bytes: Vec<u8>,
}

/// An encrypted payload. Opaque to everything but the backend that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    /// SHA-256 of the public key the payload was sealed under.
    pub key_fingerprint: ContentDigest,
    pub nonce: Vec<u8>,
    pub body: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Private inputs for a vote proof.
pub struct VoteWitness {
    pub option: Zeroizing<String>,
    pub secret: Zeroizing<[u8; 32]>,
}

impl VoteWitness {
    pub fn new(option: &str, secret: &VoterSecret) -> Self {
        Self {
            option: Zeroizing::new(option.to_string()),
            secret: Zeroizing::new(*secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for VoteWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VoteWitness([REDACTED])")
    }
}

/// What to prove.
#[derive(Debug)]
pub enum ProofRequest {
    /// The holder of `voter_handle` satisfies the ballot's eligibility
    /// criteria.
    Eligibility {
        voter_handle: VoterHandle,
        criteria: String,
    },
    /// `commitment` opens to one of `options` under the private `witness`.
    Vote {
        commitment: Commitment,
        options: Vec<String>,
        witness: VoteWitness,
    },
}

impl ProofRequest {
    pub fn kind(&self) -> ProofKind {
        match self {
            Self::Eligibility { .. } => ProofKind::Eligibility,
            Self::Vote { .. } => ProofKind::Vote,
        }
    }
}

/// Abstract interface for the zero-knowledge proof backend.
#[async_trait]
pub trait ProofBackend: Send + Sync {
    /// Commit to `value` under the blinding `secret`.
    async fn commit(&self, value: &str, secret: &VoterSecret)
        -> Result<Commitment, BackendError>;

    async fn prove(&self, request: ProofRequest) -> Result<Proof, BackendError>;

    async fn aggregate(&self, proofs: &[Proof]) -> Result<AggregatedProof, BackendError>;

    /// Seal `plaintext` under `public_key`.
    async fn encrypt(&self, plaintext: &[u8], public_key: &str)
        -> Result<Ciphertext, BackendError>;

    /// Open a ciphertext this backend produced. Key custody stays inside the
    /// backend.
    async fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Zeroizing<Vec<u8>>, BackendError>;

    /// Check that `commitment`, proven by `proof`, is a member of the pool
    /// at `root` according to the ledger's inclusion `witness`.
    async fn verify_in_pool(
        &self,
        commitment: &Commitment,
        proof: &AggregatedProof,
        root: &PoolRoot,
        witness: &InclusionWitness,
    ) -> Result<bool, BackendError>;

    /// Human-readable backend name for logs.
    fn backend_name(&self) -> &str;
}
