//! # zkvote-crypto — Cryptographic Utilities
//!
//! The building blocks shared by the registry, orchestrator and ledger:
//!
//! - **Randomness** from the OS CSPRNG for salts, voter handles and voter
//!   secrets.
//! - **Secrets** (`IdentitySecret`, `VoterSecret`, `Salt`) that zeroize on
//!   drop and never print their contents.
//! - **Constant-time comparison** for credential digests.
//! - **Nullifiers** binding a voter's credential to a ballot without
//!   revealing the credential or the voter handle.
//! - **Privacy pool accumulator**: an append-only Merkle Mountain Range over
//!   confirmed commitment digests, with inclusion witnesses.
//!
//! ## Crate Policy
//!
//! - Depends only on `zkvote-core` internally.
//! - No mocking in tests: real SHA-256, real OS randomness.

pub mod compare;
pub mod nullifier;
pub mod pool;
pub mod random;
pub mod secret;

pub use compare::ct_eq;
pub use nullifier::{derive_nullifier, Nullifier};
pub use pool::{
    verify_inclusion, InclusionWitness, PathStep, PoolAccumulator, PoolError, PoolRoot, Side,
};
pub use random::{fresh_voter_handle, random_bytes};
pub use secret::{IdentitySecret, Salt, VoterSecret};
