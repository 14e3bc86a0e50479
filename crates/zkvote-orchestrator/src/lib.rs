//! # zkvote-orchestrator — Vote Casting
//!
//! Coordinates the voter registry, ballot store, proof backend and ledger
//! to turn a voter's choice into a confirmed, anonymous vote.
//!
//! - **Orchestrator** (`orchestrator.rs`): `VoteOrchestrator`, owner of the
//!   attempt book. Ballot creation (store + ledger anchor), casting,
//!   abandoned-attempt sweeping, and pool queries.
//! - **Receipt** (`receipt.rs`): `CastVoteRequest` and `VoteReceipt`.
//! - **Config** (`config.rs`): attempt and per-call timeouts.
//!
//! ## Crate Policy
//!
//! - Lower-level errors (`BackendError`, `LedgerError`, `AttemptError`)
//!   are converted to `VoteError` here and nowhere else.
//! - No lock is held across an `.await`.

pub mod config;
pub mod orchestrator;
pub mod receipt;

pub use config::OrchestratorConfig;
pub use orchestrator::VoteOrchestrator;
pub use receipt::{CastVoteRequest, VoteReceipt};
