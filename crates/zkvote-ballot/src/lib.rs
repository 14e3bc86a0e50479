//! # zkvote-ballot — Ballots
//!
//! A ballot is created once from a validated [`BallotSpec`] and never
//! mutated. Its [`BallotStatus`] is not stored: it is derived from the
//! voting window and the current time on every read.

pub mod ballot;
pub mod store;

pub use ballot::{Ballot, BallotSpec, BallotStatus};
pub use store::BallotStore;
