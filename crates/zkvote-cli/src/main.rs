//! # zkvote CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zkvote_cli::ballot::{run_ballot, BallotArgs};
use zkvote_cli::client::ZkvoteClient;
use zkvote_cli::register::{run_register, RegisterArgs};
use zkvote_cli::simulate::{run_simulate, SimulateArgs};
use zkvote_cli::vote::{run_vote, VoteArgs};

/// zkvote: anonymous, verifiable voting.
#[derive(Parser, Debug)]
#[command(name = "zkvote", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the zkvote service.
    #[arg(long, env = "ZKVOTE_URL", default_value = "http://127.0.0.1:8080", global = true)]
    url: String,

    /// Admin bearer token for ballot creation.
    #[arg(long, env = "ZKVOTE_ADMIN_TOKEN", hide_env_values = true, global = true)]
    admin_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a voter.
    Register(RegisterArgs),

    /// Create or inspect ballots.
    Ballot(BallotArgs),

    /// Cast a vote.
    Vote(VoteArgs),

    /// Run an in-process election with the mock backend.
    Simulate(SimulateArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let client = match ZkvoteClient::new(&cli.url, cli.admin_token) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Commands::Register(args) => run_register(&args, &client).await,
        Commands::Ballot(args) => run_ballot(&args, &client).await,
        Commands::Vote(args) => run_vote(&args, &client).await,
        Commands::Simulate(args) => run_simulate(&args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
