//! # zkvote-zkp — Proof Backend
//!
//! The orchestrator treats all cryptographic proof work as a black box
//! behind [`ProofBackend`]: commitments, eligibility and vote proofs,
//! aggregation, encryption under a ballot or registration key, and
//! privacy-pool membership checks.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): the async, object-safe `ProofBackend` contract
//!   and the artifact types that cross it.
//!
//! - **Mock** (`mock.rs`): `MockProofBackend`, a deterministic transparent
//!   SHA-256 backend with fault injection and call accounting. It provides
//!   **no zero-knowledge privacy** and exists for development and tests.
//!
//! ## Crate Policy
//!
//! - Depends on `zkvote-core` and `zkvote-crypto` internally.
//! - Every operation fails closed with a [`BackendError`].

pub mod mock;
pub mod traits;

pub use mock::{CallCounts, MockProofBackend};
pub use traits::{
    AggregatedProof, BackendError, Ciphertext, Commitment, Proof, ProofBackend, ProofKind,
    ProofRequest, VoteWitness,
};
