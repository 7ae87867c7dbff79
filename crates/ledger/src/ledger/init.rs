use std::sync::Arc;

use ballot_core::identity::Identity;
use ballot_core::poll::PollId;
use ballot_db::Database;
use ballot_db::ctx::WriteTransactionCtx;
use ballot_db::error::{DbResult, DbTxError, TxSnafu};
use snafu::{ResultExt as _, Snafu};
use tokio::sync::{broadcast, watch};
use tracing::info;

use super::{
    EVENTS_CHANNEL_CAPACITY, InsertOutcome, Ledger, LedgerReadDbOps as _, LedgerWriteDbOps as _,
};
use crate::LOG_TARGET;
use crate::tables::{ledger_active_poll, ledger_poll_voters, ledger_polls};

#[derive(Debug, Snafu)]
pub enum InitError {
    #[snafu(display("Ledger already initialized with a different owner: {existing}"))]
    AlreadyInitialized { existing: Identity },
}

type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Snafu)]
pub enum OpenError {
    #[snafu(display("Ledger not initialized"))]
    NotInitialized,
    #[snafu(display("Database version {db_version} is newer than supported {code_version}"))]
    DbVersionTooHigh { db_version: u64, code_version: u64 },
}
type OpenResult<T> = Result<T, OpenError>;

impl Ledger {
    /// Init a new ledger owned by `owner`
    ///
    /// Initializing an already initialized ledger with the same owner just
    /// opens it.
    pub async fn init(db: Arc<Database>, owner: Identity) -> InitResult<Self> {
        let active_poll_id = db
            .write_with_expect_falliable(|dbtx| Self::init_tx(dbtx, owner))
            .await?;

        Ok(Self::open_internal(db, owner, active_poll_id))
    }

    /// Open a previously initialized ledger
    pub async fn open(db: Arc<Database>) -> OpenResult<Self> {
        let (owner, active_poll_id) = db.write_with_expect_falliable(Self::open_tx).await?;

        Ok(Self::open_internal(db, owner, active_poll_id))
    }

    fn open_internal(db: Arc<Database>, owner: Identity, active_poll_id: PollId) -> Self {
        let (events_tx, _) = broadcast::channel(EVENTS_CHANNEL_CAPACITY);
        let (active_poll_tx, active_poll_rx) = watch::channel(active_poll_id);

        info!(
            target: LOG_TARGET,
            owner = %owner.to_short(),
            active_poll_id = %active_poll_id,
            ephemeral = db.is_ephemeral(),
            "Ledger ready"
        );

        Self {
            db,
            owner,
            events_tx,
            active_poll_tx,
            active_poll_rx,
        }
    }

    fn init_tx(dbtx: &WriteTransactionCtx, owner: Identity) -> Result<PollId, DbTxError<InitError>> {
        if let InsertOutcome::AlreadyPresent(existing) = dbtx.insert_owner(owner)? {
            if existing != owner {
                return AlreadyInitializedSnafu { existing }.fail().context(TxSnafu);
            }
        }

        if dbtx.get_db_version()?.is_none() {
            dbtx.set_db_version(Self::DB_VERSION)?;
        }

        Self::init_tables_tx(dbtx)?;

        Ok(dbtx.get_active_poll_id()?)
    }

    fn open_tx(dbtx: &WriteTransactionCtx) -> Result<(Identity, PollId), DbTxError<OpenError>> {
        let Some(owner) = dbtx.get_owner()? else {
            return NotInitializedSnafu.fail().context(TxSnafu);
        };

        let db_version = dbtx.get_db_version()?.unwrap_or_default();
        if Self::DB_VERSION < db_version {
            return DbVersionTooHighSnafu {
                db_version,
                code_version: Self::DB_VERSION,
            }
            .fail()
            .context(TxSnafu);
        }

        Self::init_tables_tx(dbtx)?;

        Ok((owner, dbtx.get_active_poll_id()?))
    }

    /// Create all tables, so reads never hit a missing one
    fn init_tables_tx(dbtx: &WriteTransactionCtx) -> DbResult<()> {
        dbtx.open_table(&ledger_active_poll::TABLE)?;
        dbtx.open_table(&ledger_polls::TABLE)?;
        dbtx.open_table(&ledger_poll_voters::TABLE)?;
        Ok(())
    }
}
