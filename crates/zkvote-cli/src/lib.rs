//! # zkvote-cli — Command-Line Client
//!
//! Provides the `zkvote` binary.
//!
//! ## Subcommands
//!
//! - `zkvote register` — Register a voter and print the handle and credential.
//! - `zkvote ballot create|show` — Create (admin) or inspect a ballot.
//! - `zkvote vote` — Cast a vote; the blinding secret is generated locally.
//! - `zkvote simulate` — Run a whole election in-process against the mock
//!   backend and in-memory ledger.
//!
//! Network subcommands talk to `ZKVOTE_URL` (default
//! `http://127.0.0.1:8080`). Output is JSON on stdout.

pub mod ballot;
pub mod client;
pub mod register;
pub mod simulate;
pub mod vote;

use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
