//! # zkvote-core — Foundational Types
//!
//! Every other zkvote crate depends on this one; it depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `VoterHandle`, `BallotId`,
//!    `CredentialDigest`, `IdempotencyKey`, `AttemptId`. A handle can never be
//!    passed where a credential digest is expected.
//!
//! 2. **One error taxonomy.** [`VoteError`] carries a stable [`ErrorKind`]
//!    for every failure a caller can observe. Messages never contain
//!    identities, chosen options, or cryptographic material.
//!
//! 3. **UTC-only timestamps behind a [`Clock`].** Ballot windows and attempt
//!    timeouts are computed from a `Clock` so tests can move time explicitly.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `zkvote-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use digest::{sha256, ContentDigest, DigestParseError, Sha256Accumulator};
pub use error::{ErrorKind, VoteError};
pub use identity::{
    AttemptId, BallotId, CredentialDigest, IdempotencyKey, IdentifierError, VoterHandle,
};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp, TimestampError};
