use std::path::PathBuf;

use ballot_core::identity::Identity;
use ballot_core::poll::PollId;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct Opts {
    /// Directory holding the ledger database
    ///
    /// Without it an ephemeral in-memory database is used.
    #[arg(long, env = "BALLOT_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// File with the caller's secret key
    #[arg(long, env = "BALLOT_SECRET_PATH", global = true)]
    pub secret_path: Option<PathBuf>,

    /// Caller identity, takes precedence over `--secret-path`
    #[arg(long, env = "BALLOT_CALLER", global = true)]
    pub caller: Option<Identity>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Generate a new secret key
    GenSecret,
    /// Initialize a new ledger
    Init {
        /// Owner of the ledger, the caller by default
        #[arg(long)]
        owner: Option<Identity>,
    },
    #[command(flatten)]
    Ledger(LedgerCommands),
}

/// Commands working on an already initialized ledger
#[derive(Debug, Subcommand)]
pub(crate) enum LedgerCommands {
    /// Print the ledger owner
    Owner,
    /// Print the active poll
    Active,
    /// Print a poll
    Get { poll_id: PollId },
    /// Print all polls
    List,
    /// Check if an identity voted in a poll
    HasVoted {
        poll_id: PollId,

        /// Identity to check, the caller by default
        #[arg(long)]
        voter: Option<Identity>,
    },
    /// Create a new poll (owner only)
    Create {
        #[arg(long)]
        question: String,

        #[arg(long = "option", required = true)]
        options: Vec<String>,
    },
    /// Vote in the active poll
    Vote {
        #[arg(allow_negative_numbers = true)]
        option_idx: i64,
    },
    /// Close the active poll (owner only)
    Close,
}
