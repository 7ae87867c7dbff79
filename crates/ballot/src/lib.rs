// SPDX-License-Identifier: MIT

//! `ballot` command line
//!
//! Deployer (`init`) and a scriptable client of a [`Ledger`] stored in
//! `--data-dir`. Commands print JSON on stdout, logs go to stderr.

mod logging;
mod opts;
#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::str::FromStr as _;
use std::sync::Arc;

use ballot_core::event::LedgerEvent;
use ballot_core::identity::{Identity, IdentitySeckey};
use ballot_db::Database;
use ballot_ledger::Ledger;
use ballot_util_error::WhateverResult;
use clap::Parser as _;
use opts::{Commands, LedgerCommands, Opts};
use serde_json::json;
use snafu::{OptionExt as _, ResultExt as _};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "ballot::cli";

const DB_FILE_NAME: &str = "ballot.redb";

pub struct Ballot {
    _private: (),
}

#[bon::bon]
impl Ballot {
    #[builder(finish_fn = run, start_fn = builder)]
    pub async fn build(
        /// Use this database instead of the one in `--data-dir`
        db: Option<Arc<Database>>,
    ) -> WhateverResult<()> {
        logging::init_logging()?;

        let opts = Opts::parse();

        if let Some(output) = Self::execute(opts, db).await? {
            println!(
                "{}",
                serde_json::to_string_pretty(&output)
                    .whatever_context("Failed to serialize output")?
            );
        }

        Ok(())
    }
}

impl Ballot {
    async fn execute(
        opts: Opts,
        db: Option<Arc<Database>>,
    ) -> WhateverResult<Option<serde_json::Value>> {
        match opts.command {
            Commands::GenSecret => {
                let seckey = IdentitySeckey::generate();
                eprintln!("Identity: {}", seckey.pubkey());
                eprintln!();
                println!("{seckey}");
                eprintln!();
                eprintln!(
                    "This secret is irrecoverable if lost. Please make a back up before using it!",
                );
                Ok(None)
            }
            Commands::Init { owner } => {
                let caller = Self::load_caller(opts.caller, opts.secret_path.as_deref()).await?;
                let owner = owner.or(caller).whatever_context(
                    "Ledger owner must be given with `--owner`, `--caller` or `--secret-path`",
                )?;
                let db = Self::get_db(db, opts.data_dir).await?;

                let ledger = Ledger::init(db, owner)
                    .await
                    .whatever_context("Failed to initialize ledger")?;
                info!(target: LOG_TARGET, owner = %ledger.owner(), "Ledger initialized");

                Ok(Some(json!({ "owner": ledger.owner() })))
            }
            Commands::Ledger(command) => {
                let caller = Self::load_caller(opts.caller, opts.secret_path.as_deref()).await?;
                let ledger = Ledger::open(Self::get_db(db, opts.data_dir).await?)
                    .await
                    .whatever_context("Failed to open ledger")?;

                Ok(Some(Self::execute_ledger(&ledger, command, caller).await?))
            }
        }
    }

    async fn execute_ledger(
        ledger: &Ledger,
        command: LedgerCommands,
        caller: Option<Identity>,
    ) -> WhateverResult<serde_json::Value> {
        let require_caller = || -> WhateverResult<Identity> {
            caller.whatever_context("Caller must be given with `--caller` or `--secret-path`")
        };

        Ok(match command {
            LedgerCommands::Owner => json!({ "owner": ledger.owner() }),
            LedgerCommands::Active => to_json(&ledger.get_active().await)?,
            LedgerCommands::Get { poll_id } => to_json(
                &ledger
                    .get_by_id(poll_id)
                    .await
                    .whatever_context("Failed to get poll")?,
            )?,
            LedgerCommands::List => to_json(&ledger.list_polls().await)?,
            LedgerCommands::HasVoted { poll_id, voter } => {
                let voter = match voter {
                    Some(voter) => voter,
                    None => require_caller()?,
                };
                let has_voted = ledger
                    .has_voted(poll_id, voter)
                    .await
                    .whatever_context("Failed to check vote")?;
                json!({ "poll_id": poll_id, "voter": voter, "has_voted": has_voted })
            }
            LedgerCommands::Create { question, options } => {
                let mut events = ledger.subscribe();
                ledger
                    .create(require_caller()?, &question, &options)
                    .await
                    .whatever_context("Failed to create poll")?;
                committed_event(&mut events)?
            }
            LedgerCommands::Vote { option_idx } => {
                let mut events = ledger.subscribe();
                ledger
                    .vote(require_caller()?, option_idx)
                    .await
                    .whatever_context("Failed to vote")?;
                committed_event(&mut events)?
            }
            LedgerCommands::Close => {
                let mut events = ledger.subscribe();
                ledger
                    .close(require_caller()?)
                    .await
                    .whatever_context("Failed to close poll")?;
                committed_event(&mut events)?
            }
        })
    }

    /// Caller identity, `--caller` first, then the public key of `--secret-path`
    async fn load_caller(
        caller: Option<Identity>,
        secret_path: Option<&Path>,
    ) -> WhateverResult<Option<Identity>> {
        if let Some(caller) = caller {
            return Ok(Some(caller));
        }

        let Some(secret_path) = secret_path else {
            return Ok(None);
        };

        let seckey = IdentitySeckey::from_str(
            tokio::fs::read_to_string(secret_path)
                .await
                .whatever_context("Failed to read secret file")?
                .trim(),
        )
        .whatever_context("Failed to parse secret")?;

        Ok(Some(seckey.pubkey()))
    }

    async fn get_db(
        db: Option<Arc<Database>>,
        data_dir: Option<PathBuf>,
    ) -> WhateverResult<Arc<Database>> {
        if let Some(db) = db {
            return Ok(db);
        }

        let Some(data_dir) = data_dir else {
            warn!(target: LOG_TARGET, "No `--data-dir` given, using an ephemeral database");
            return Ok(Arc::new(
                Database::new_in_memory()
                    .await
                    .whatever_context("Failed to create in-memory database")?,
            ));
        };

        tokio::fs::create_dir_all(&data_dir)
            .await
            .whatever_context("Failed to create/open data dir")?;
        let path = data_dir.join(DB_FILE_NAME);
        info!(target: LOG_TARGET, path = %path.display(), "Opening ledger database");

        Ok(Arc::new(
            Database::open(path)
                .await
                .whatever_context("Failed to open database")?,
        ))
    }
}

fn to_json(value: &impl serde::Serialize) -> WhateverResult<serde_json::Value> {
    serde_json::to_value(value).whatever_context("Failed to serialize output")
}

/// Event of the change just committed by the ledger
fn committed_event(
    events: &mut broadcast::Receiver<LedgerEvent>,
) -> WhateverResult<serde_json::Value> {
    let event = events
        .try_recv()
        .whatever_context("Ledger did not report the committed change")?;
    debug!(target: LOG_TARGET, poll_id = %event.poll_id(), ?event, "Change committed");
    to_json(&event)
}
