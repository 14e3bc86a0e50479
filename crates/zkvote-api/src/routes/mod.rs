//! # API Route Modules
//!
//! - `voters`: registration, registration checks, revocation.
//! - `ballots`: ballot creation, queries, privacy-pool status.
//! - `votes`: the vote casting pipeline.

pub mod ballots;
pub mod voters;
pub mod votes;
