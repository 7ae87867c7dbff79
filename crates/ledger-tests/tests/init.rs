use std::sync::Arc;

use assert_matches::assert_matches;
use ballot_core::poll::{PollId, PollRecord};
use ballot_db::Database;
use ballot_ledger::tables::ledger_db_version;
use ballot_ledger::{InitError, Ledger, OpenError};
use ballot_ledger_tests::{Setup, random_identity};
use ballot_util_error::BoxedErrorResult;

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn open_requires_init() -> BoxedErrorResult<()> {
    let db = Arc::new(Database::new_in_memory().await?);

    assert_matches!(
        Ledger::open(db.clone()).await,
        Err(OpenError::NotInitialized)
    );

    let owner = random_identity();
    Ledger::init(db.clone(), owner).await?;
    assert_eq!(Ledger::open(db).await?.owner(), owner);

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn init_is_idempotent_for_same_owner() -> BoxedErrorResult<()> {
    let setup = Setup::bootstrap().await?;
    let poll_id = setup.ledger.create(setup.owner(), "Q", &["A", "B"]).await?;

    let ledger = Ledger::init(setup.db.clone(), setup.owner()).await?;

    assert_eq!(ledger.owner(), setup.owner());
    assert_eq!(ledger.get_active().await.id, poll_id);
    assert_eq!(*ledger.active_poll_rx().borrow(), poll_id);

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn owner_can_not_be_replaced() -> BoxedErrorResult<()> {
    let setup = Setup::bootstrap().await?;

    assert_matches!(
        Ledger::init(setup.db.clone(), random_identity()).await,
        Err(InitError::AlreadyInitialized { existing }) if existing == setup.owner()
    );
    assert_eq!(setup.reopen().await?.owner(), setup.owner());

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn state_survives_reopen() -> BoxedErrorResult<()> {
    let setup = Setup::bootstrap().await?;
    let owner = setup.owner();
    let voter = random_identity();

    setup.ledger.create(owner, "Q1", &["A", "B"]).await?;
    setup.ledger.vote(voter, 1).await?;
    setup.ledger.close(owner).await?;
    let poll_id = setup
        .ledger
        .create(owner, "Q2", &["C", "D", "E"])
        .await?;
    drop(setup.ledger);

    let ledger = Ledger::open(setup.db.clone()).await?;

    assert_eq!(
        ledger.get_by_id(PollId::FIRST).await?,
        PollRecord {
            id: PollId::FIRST,
            question: "Q1".into(),
            options: vec!["A".into(), "B".into()],
            tally: vec![0, 1],
            active: false,
        }
    );
    assert!(ledger.has_voted(PollId::FIRST, voter).await?);
    assert_eq!(ledger.get_active().await.id, poll_id);

    // Id sequence continues where it left off
    assert_eq!(
        ledger.create(owner, "Q3", &["F", "G"]).await?,
        PollId::from(3)
    );

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn open_rejects_newer_db_version() -> BoxedErrorResult<()> {
    let setup = Setup::bootstrap().await?;

    setup
        .db
        .write_with_expect(|dbtx| {
            let mut tbl = dbtx.open_table(&ledger_db_version::TABLE)?;
            tbl.insert(&(), &(Ledger::DB_VERSION + 1))?;
            Ok(())
        })
        .await;

    assert_matches!(
        Ledger::open(setup.db.clone()).await,
        Err(OpenError::DbVersionTooHigh { db_version, code_version })
            if db_version == Ledger::DB_VERSION + 1 && code_version == Ledger::DB_VERSION
    );

    Ok(())
}
