//! # Ballot Subcommand
//!
//! - `create` — Create a ballot (needs the admin token).
//! - `show` — Show a ballot, its status, and its privacy-pool root.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use zkvote_api::routes::ballots::{BallotView, PoolView};
use zkvote_ballot::BallotSpec;
use zkvote_core::Timestamp;

use crate::client::ZkvoteClient;
use crate::print_json;

/// Arguments for `zkvote ballot`.
#[derive(Args, Debug)]
pub struct BallotArgs {
    #[command(subcommand)]
    pub command: BallotCommand,
}

#[derive(Subcommand, Debug)]
pub enum BallotCommand {
    /// Create a ballot.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// A choice; repeat for each option, in order.
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        /// Seconds from now until voting opens.
        #[arg(long, default_value_t = 0)]
        opens_in_secs: i64,
        /// How long voting stays open.
        #[arg(long, default_value_t = 3600)]
        duration_secs: i64,
        /// Descriptor handed to the eligibility prover.
        #[arg(long, default_value = "")]
        eligibility: String,
        /// Key that encrypted votes are sealed under.
        #[arg(long)]
        public_key: String,
    },

    /// Show a ballot and its privacy pool.
    Show {
        /// Ballot id.
        id: u64,
    },
}

#[derive(Serialize)]
struct BallotReport {
    #[serde(flatten)]
    ballot: BallotView,
    pool: PoolView,
}

pub async fn run_ballot(args: &BallotArgs, client: &ZkvoteClient) -> Result<u8> {
    match &args.command {
        BallotCommand::Create {
            title,
            description,
            options,
            opens_in_secs,
            duration_secs,
            eligibility,
            public_key,
        } => {
            if *duration_secs <= 0 {
                bail!("--duration-secs must be positive");
            }
            let open_at = Timestamp::now().plus_secs(*opens_in_secs);
            let spec = BallotSpec {
                title: title.clone(),
                description: description.clone(),
                open_at,
                close_at: open_at.plus_secs(*duration_secs),
                options: options.clone(),
                eligibility_criteria: eligibility.clone(),
                public_key: public_key.clone(),
            };
            let view = client.create_ballot(&spec).await?;
            tracing::info!(ballot = view.ballot.id.as_u64(), "ballot created");
            print_json(&view)?;
        }
        BallotCommand::Show { id } => {
            let ballot = client.ballot(*id).await?;
            let pool = client.pool(*id).await?;
            print_json(&BallotReport { ballot, pool })?;
        }
    }
    Ok(0)
}
