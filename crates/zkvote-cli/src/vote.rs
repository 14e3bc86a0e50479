//! # Vote Subcommand

use anyhow::{Context, Result};
use clap::Args;
use zkvote_core::{CredentialDigest, VoterHandle};

use crate::client::ZkvoteClient;
use crate::print_json;

/// Arguments for `zkvote vote`.
#[derive(Args, Debug)]
pub struct VoteArgs {
    /// Ballot id.
    #[arg(long)]
    pub ballot: u64,
    /// Voter handle from registration.
    #[arg(long)]
    pub handle: String,
    /// Credential digest from registration.
    #[arg(long)]
    pub credential: String,
    /// The chosen option, exactly as listed on the ballot.
    #[arg(long)]
    pub option: String,
}

pub async fn run_vote(args: &VoteArgs, client: &ZkvoteClient) -> Result<u8> {
    let handle = VoterHandle::parse(&args.handle).context("invalid --handle")?;
    let credential = CredentialDigest::parse(&args.credential).context("invalid --credential")?;

    let receipt = client
        .cast_vote(args.ballot, &handle, &credential, &args.option)
        .await?;
    print_json(&receipt)?;
    Ok(0)
}
