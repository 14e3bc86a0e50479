//! # zkvote-state — Vote Attempt State Machine
//!
//! Every casting attempt for a (voter, ballot) pair is tracked by an
//! [`AttemptMarker`] moving through
//!
//! ```text
//! (absent) ──▶ Pending ──▶ Committed ──▶ Submitted ──▶ Confirmed
//!                 │            │             │
//!                 └────────────┴─────────────┴──────▶ Rejected(kind)
//! ```
//!
//! The [`AttemptBook`] holds one marker per pair and is the duplicate gate:
//! a new attempt may only start when the pair has no marker, a releasable
//! `Rejected` marker, or a stale non-terminal marker. The check and the
//! write happen under one `DashMap` shard lock.

pub mod attempt;
pub mod book;

pub use attempt::{AttemptError, AttemptMarker, AttemptState, AttemptTransition};
pub use book::{AttemptBook, AttemptKey};
