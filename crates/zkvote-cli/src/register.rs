//! # Register Subcommand

use anyhow::Result;
use clap::Args;

use crate::client::ZkvoteClient;
use crate::print_json;

/// Arguments for `zkvote register`.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Real-world identity. Sent once and never stored in clear.
    #[arg(long)]
    pub identity: String,
    /// Key the credential is sealed under.
    #[arg(long)]
    pub public_key: String,
    /// Makes the request safe to retry.
    #[arg(long)]
    pub idempotency_key: Option<String>,
}

pub async fn run_register(args: &RegisterArgs, client: &ZkvoteClient) -> Result<u8> {
    let result = client
        .register(&args.identity, &args.public_key, args.idempotency_key.as_deref())
        .await?;
    tracing::info!(voter = result.voter_handle.short(), "registered");
    eprintln!("Keep the credential digest: it is shown only once.");
    print_json(&result)?;
    Ok(0)
}
