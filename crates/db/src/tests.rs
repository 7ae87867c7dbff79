use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ballot_util_db::def_table;
use ballot_util_error::BoxedErrorResult;
use redb_bincode::ReadableTable as _;
use snafu::{ResultExt as _, Snafu};

use crate::Database;
use crate::error::TxSnafu;

def_table! {
    test_values: u64 => u64
}

#[derive(Debug, Snafu)]
struct Rejected;

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn commit_hooks_run_only_after_successful_commit() -> BoxedErrorResult<()> {
    let db = Database::new_in_memory().await?;
    let hooks_run = Arc::new(AtomicUsize::new(0));

    db.write_with_expect(|dbtx| {
        let mut tbl = dbtx.open_table(&test_values::TABLE)?;
        tbl.insert(&1, &10)?;
        let hooks_run = hooks_run.clone();
        dbtx.on_commit(move || {
            hooks_run.fetch_add(1, Ordering::SeqCst);
        });
        Ok(())
    })
    .await;
    assert_eq!(hooks_run.load(Ordering::SeqCst), 1);

    let res = db
        .write_with_expect_falliable(|dbtx| {
            let mut tbl = dbtx.open_table(&test_values::TABLE)?;
            tbl.insert(&2, &20)?;
            let hooks_run = hooks_run.clone();
            dbtx.on_commit(move || {
                hooks_run.fetch_add(1, Ordering::SeqCst);
            });
            Err::<(), _>(Rejected).context(TxSnafu)
        })
        .await;
    assert!(res.is_err());
    assert_eq!(hooks_run.load(Ordering::SeqCst), 1);

    let (first, second) = db
        .read_with_expect(|dbtx| {
            let tbl = dbtx.open_table(&test_values::TABLE)?;
            Ok((
                tbl.get(&1)?.map(|g| g.value()),
                tbl.get(&2)?.map(|g| g.value()),
            ))
        })
        .await;
    assert_eq!(first, Some(10));
    assert_eq!(second, None);

    assert!(db.is_ephemeral());
    Ok(())
}
