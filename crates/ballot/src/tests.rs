use std::path::PathBuf;
use std::sync::Arc;

use ballot_core::identity::{Identity, IdentitySeckey};
use ballot_db::Database;
use ballot_util_error::fmt::FmtCompact as _;
use ballot_util_error::{BoxedErrorResult, WhateverResult};
use clap::{CommandFactory as _, Parser as _};
use serde_json::{Value, json};
use snafu::ResultExt as _;

use crate::Ballot;
use crate::opts::Opts;

async fn run_cli(db: &Arc<Database>, args: &[&str]) -> WhateverResult<Option<Value>> {
    run_cli_with(Some(db.clone()), args).await
}

/// Run the command line, opening the database from `--data-dir` if `db` is not given
async fn run_cli_with(db: Option<Arc<Database>>, args: &[&str]) -> WhateverResult<Option<Value>> {
    let opts = Opts::try_parse_from(std::iter::once("ballot").chain(args.iter().copied()))
        .whatever_context("Failed to parse arguments")?;
    Ballot::execute(opts, db).await
}

/// Fresh, empty directory for a test
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("ballot-cli-tests")
        .join(format!("{name}-{}", IdentitySeckey::generate().pubkey().to_short()));
    std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

fn write_secret(dir: &std::path::Path, name: &str) -> (PathBuf, Identity) {
    let seckey = IdentitySeckey::generate();
    let path = dir.join(name);
    std::fs::write(&path, format!("{seckey}\n")).expect("Failed to write secret");
    (path, seckey.pubkey())
}

async fn run_cli_as(db: &Arc<Database>, caller: Identity, args: &[&str]) -> WhateverResult<Value> {
    let caller = caller.to_string();
    let args: Vec<&str> = ["--caller", caller.as_str()]
        .into_iter()
        .chain(args.iter().copied())
        .collect();
    Ok(run_cli(db, &args)
        .await?
        .expect("Ledger commands always produce output"))
}

#[test]
fn opts_are_valid() {
    Opts::command().debug_assert();
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn poll_lifecycle_via_cli() -> BoxedErrorResult<()> {
    let db = Arc::new(Database::new_in_memory().await?);
    let owner = IdentitySeckey::generate().pubkey();
    let voter = IdentitySeckey::generate().pubkey();

    assert_eq!(
        run_cli_as(&db, owner, &["init"]).await?,
        json!({ "owner": owner.to_string() })
    );

    assert_eq!(
        run_cli_as(
            &db,
            owner,
            &["create", "--question", "Best language?", "--option", "Solidity", "--option", " Rust "]
        )
        .await?,
        json!({ "created": {
            "poll_id": 1,
            "question": "Best language?",
            "options": ["Solidity", "Rust"],
        }})
    );

    assert_eq!(
        run_cli_as(&db, voter, &["vote", "1"]).await?,
        json!({ "voted": { "poll_id": 1, "voter": voter.to_string(), "option_idx": 1 } })
    );
    assert!(run_cli_as(&db, voter, &["vote", "0"]).await.is_err());
    assert!(run_cli_as(&db, owner, &["vote", "-1"]).await.is_err());

    assert_eq!(
        run_cli_as(&db, owner, &["has-voted", "1", "--voter", &voter.to_string()]).await?["has_voted"],
        json!(true)
    );
    assert_eq!(
        run_cli_as(&db, owner, &["has-voted", "1"]).await?["has_voted"],
        json!(false)
    );

    assert!(run_cli_as(&db, voter, &["close"]).await.is_err());
    assert_eq!(
        run_cli_as(&db, owner, &["close"]).await?,
        json!({ "closed": { "poll_id": 1 } })
    );

    assert_eq!(
        run_cli_as(&db, voter, &["get", "1"]).await?,
        json!({
            "id": 1,
            "question": "Best language?",
            "options": ["Solidity", "Rust"],
            "tally": [0, 1],
            "active": false,
        })
    );
    assert_eq!(
        run_cli_as(&db, voter, &["active"]).await?,
        run_cli_as(&db, voter, &["get", "1"]).await?
    );
    assert_eq!(
        run_cli_as(&db, voter, &["owner"]).await?,
        json!({ "owner": owner.to_string() })
    );

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn commands_need_caller_and_init() -> BoxedErrorResult<()> {
    let db = Arc::new(Database::new_in_memory().await?);

    assert!(run_cli(&db, &["active"]).await.is_err());
    assert!(run_cli(&db, &["init"]).await.is_err());

    let owner = IdentitySeckey::generate().pubkey();
    run_cli(&db, &["init", "--owner", &owner.to_string()]).await?;

    assert_eq!(run_cli(&db, &["list"]).await?, Some(json!([])));
    assert!(
        run_cli(&db, &["create", "--question", "Q", "--option", "A", "--option", "B"])
            .await
            .is_err()
    );
    assert!(run_cli(&db, &["get", "1"]).await.is_err());

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn caller_from_secret_file() -> BoxedErrorResult<()> {
    let db = Arc::new(Database::new_in_memory().await?);
    let dir = temp_dir("secret");
    let (owner_path, owner) = write_secret(&dir, "owner.secret");
    let (stranger_path, _) = write_secret(&dir, "stranger.secret");
    let owner_path = owner_path.to_string_lossy().into_owned();
    let stranger_path = stranger_path.to_string_lossy().into_owned();

    assert_eq!(
        run_cli(&db, &["--secret-path", &owner_path, "init"]).await?,
        Some(json!({ "owner": owner.to_string() }))
    );

    let create = ["create", "--question", "Q", "--option", "A", "--option", "B"];
    let err = run_cli(&db, &[&["--secret-path", stranger_path.as_str()][..], &create].concat())
        .await
        .expect_err("Only the owner can create polls");
    assert!(
        err.fmt_compact().to_string().contains("is not the ledger owner"),
        "{}",
        err.fmt_compact()
    );

    assert!(
        run_cli(&db, &[&["--secret-path", owner_path.as_str()][..], &create].concat())
            .await
            .is_ok()
    );

    // `--caller` takes precedence over `--secret-path`
    let stranger = IdentitySeckey::generate().pubkey().to_string();
    assert!(
        run_cli(
            &db,
            &["--secret-path", &owner_path, "--caller", &stranger, "close"]
        )
        .await
        .is_err()
    );

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn gen_secret_needs_no_caller() -> BoxedErrorResult<()> {
    let db = Arc::new(Database::new_in_memory().await?);
    let missing = temp_dir("gen-secret")
        .join("missing.secret")
        .to_string_lossy()
        .into_owned();

    assert_eq!(
        run_cli(&db, &["--secret-path", &missing, "gen-secret"]).await?,
        None
    );
    assert!(
        run_cli(&db, &["--secret-path", &missing, "owner"])
            .await
            .is_err()
    );

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn data_dir_persists_ledger() -> BoxedErrorResult<()> {
    let dir = temp_dir("data-dir");
    let data_dir = dir.join("data").to_string_lossy().into_owned();
    let owner = IdentitySeckey::generate().pubkey().to_string();
    let voter = IdentitySeckey::generate().pubkey().to_string();

    run_cli_with(None, &["--data-dir", &data_dir, "--caller", &owner, "init"]).await?;
    run_cli_with(
        None,
        &[
            "--data-dir", &data_dir, "--caller", &owner, "create", "--question", "Q", "--option",
            "A", "--option", "B",
        ],
    )
    .await?;
    run_cli_with(None, &["--data-dir", &data_dir, "--caller", &voter, "vote", "0"]).await?;

    assert!(dir.join("data").join("ballot.redb").exists());
    assert_eq!(
        run_cli_with(None, &["--data-dir", &data_dir, "get", "1"]).await?,
        Some(json!({
            "id": 1,
            "question": "Q",
            "options": ["A", "B"],
            "tally": [1, 0],
            "active": true,
        }))
    );
    assert!(
        run_cli_with(None, &["--data-dir", &data_dir, "--caller", &voter, "vote", "1"])
            .await
            .is_err()
    );

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}
