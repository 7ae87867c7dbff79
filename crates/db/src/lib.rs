// SPDX-License-Identifier: MIT

//! Thin wrapper over a `redb` database
//!
//! All writes go through [`Database::write_with_expect_falliable`] (or its
//! infallible sibling), which runs the closure in a single write
//! transaction, and commits only if it succeeded. redb allows only one
//! writer at a time, so write transactions are serialized.

pub mod ctx;
pub mod error;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ballot_util_error::fmt::FmtCompact as _;
use ctx::WriteTransactionCtx;
use error::{
    CommitSnafu, DatabaseSnafu, DbResult, DbTxError, DbTxResult, InvalidPathSnafu, JoinSnafu,
    TransactionSnafu,
};
use redb_bincode::{ReadTransaction, redb};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{debug, instrument, warn};

const LOG_TARGET: &str = "ballot::db";

#[derive(Debug)]
pub struct Database {
    inner: redb_bincode::Database,
    commit_hook_order_lock: Arc<Mutex<()>>,
    ephemeral: bool,
}

impl Database {
    pub async fn new_in_memory() -> DbResult<Database> {
        debug!(target: LOG_TARGET, "Opening in-memory database");
        let inner = redb::Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .context(DatabaseSnafu)?;
        Self::open_inner(inner, true).await
    }

    pub async fn open(path: impl Into<PathBuf>) -> DbResult<Database> {
        let path = path.into();
        tokio::fs::create_dir_all(path.parent().context(InvalidPathSnafu)?).await?;
        debug!(target: LOG_TARGET, path = %path.display(), "Opening database…");

        let inner = tokio::task::spawn_blocking(move || {
            let mut db = redb::Database::create(path)?;
            let _ = db.compact().inspect_err(|err| {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to compact database");
            });
            Ok(db)
        })
        .await
        .context(JoinSnafu)?
        .context(DatabaseSnafu)?;

        Self::open_inner(inner, false).await
    }

    #[instrument(skip_all)]
    async fn open_inner(inner: redb::Database, ephemeral: bool) -> DbResult<Database> {
        Ok(Self {
            inner: redb_bincode::Database::from(inner),
            commit_hook_order_lock: Arc::new(Mutex::new(())),
            ephemeral,
        })
    }

    fn write_with_inner_falliable<T, E>(
        &self,
        f: impl FnOnce(&'_ WriteTransactionCtx) -> DbTxResult<T, E>,
    ) -> DbTxResult<T, E>
    where
        E: snafu::Error + 'static,
    {
        tokio::task::block_in_place(|| {
            let dbtx = WriteTransactionCtx::new(
                self.inner.begin_write().context(TransactionSnafu)?,
                self.commit_hook_order_lock.clone(),
            );
            // On error `dbtx` is dropped here, which aborts the transaction.
            let res = f(&dbtx)?;
            dbtx.commit().context(CommitSnafu)?;

            Ok(res)
        })
    }

    fn read_with_inner_falliable<T, E>(
        &self,
        f: impl FnOnce(&'_ ReadTransaction) -> DbTxResult<T, E>,
    ) -> DbTxResult<T, E>
    where
        E: snafu::Error + 'static,
    {
        tokio::task::block_in_place(|| {
            let dbtx = self.inner.begin_read().context(TransactionSnafu)?;

            f(&dbtx)
        })
    }

    /// Do a writeable database transaction, panic on internal db errors,
    /// and return logical errors of `f`
    pub async fn write_with_expect_falliable<T, E>(
        &self,
        f: impl FnOnce(&'_ WriteTransactionCtx) -> DbTxResult<T, E>,
    ) -> Result<T, E>
    where
        E: snafu::Error + 'static,
    {
        match self.write_with_inner_falliable(f) {
            Ok(o) => Ok(o),
            Err(DbTxError::DbError { source, location }) => {
                panic!("Database error: {source:#} at {location}")
            }
            Err(DbTxError::TxError {
                source,
                location: _,
            }) => Err(source),
        }
    }

    /// Do a writeable database transaction and panic on internal db errors
    ///
    /// If the handler `f` can fail for logical reasons, use
    /// [`Self::write_with_expect_falliable`]
    pub async fn write_with_expect<T>(
        &self,
        f: impl FnOnce(&'_ WriteTransactionCtx) -> DbResult<T>,
    ) -> T {
        self.write_with_inner_falliable::<T, std::convert::Infallible>(|dbtx| Ok(f(dbtx)?))
            .unwrap_or_else(|err| panic!("Fatal database error: {err}"))
    }

    pub async fn read_with_expect_falliable<T, E>(
        &self,
        f: impl FnOnce(&'_ ReadTransaction) -> DbTxResult<T, E>,
    ) -> Result<T, E>
    where
        E: snafu::Error + 'static,
    {
        match self.read_with_inner_falliable(f) {
            Ok(o) => Ok(o),
            Err(DbTxError::DbError { source, location }) => {
                panic!("Database error: {source:#} at {location}")
            }
            Err(DbTxError::TxError {
                source,
                location: _,
            }) => Err(source),
        }
    }

    pub async fn read_with_expect<T>(
        &self,
        f: impl FnOnce(&'_ ReadTransaction) -> DbResult<T>,
    ) -> T {
        self.read_with_inner_falliable::<T, std::convert::Infallible>(|dbtx| Ok(f(dbtx)?))
            .unwrap_or_else(|err| panic!("Fatal database error: {err}"))
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }
}

#[cfg(test)]
mod tests;
