//! # zkvote-ledger — Ledger Adapter
//!
//! The distributed ledger is the system of record for votes: it anchors
//! ballot windows, accepts encrypted votes with their commitments, proofs
//! and nullifiers, and maintains each ballot's privacy pool.
//!
//! - **Adapter** (`adapter.rs`): the async `LedgerAdapter` contract.
//! - **Memory** (`memory.rs`): `InMemoryLedger`, a single-process ledger
//!   with an ordered vote log and Merkle Mountain Range pools. It has no
//!   consensus and is intended for development and tests.
//!
//! The ledger is authoritative on two questions the orchestrator cannot
//! settle alone: whether the ballot was open at submission time, and whether
//! the nullifier was already spent.

pub mod adapter;
pub mod memory;

pub use adapter::{
    BallotAnchor, LedgerAdapter, LedgerError, Rejection, SubmissionOutcome, VoteSubmission,
};
pub use memory::{InMemoryLedger, LedgerEntry};
