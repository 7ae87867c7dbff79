mod close;
mod create;
mod getters;
mod init;
mod version;
mod vote;

use std::sync::Arc;

use ballot_core::event::LedgerEvent;
use ballot_core::identity::Identity;
use ballot_core::poll::{PollId, PollRecord};
use ballot_db::Database;
use ballot_db::ctx::WriteTransactionCtx;
use ballot_db::error::DbResult;
use ballot_util_db::range::get_last_in_range;
pub use init::{InitError, OpenError};
use redb_bincode::{ReadTransaction, ReadableTable as _};
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::tables::{
    ledger_active_poll, ledger_db_version, ledger_owner, ledger_poll_voters, ledger_polls,
};
use crate::{LOG_TARGET, LedgerResult, UnauthorizedSnafu};

/// How many [`LedgerEvent`]s a slow subscriber can lag behind before
/// it starts missing them
const EVENTS_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct Ledger {
    /// Database the ledger stores its state in
    db: Arc<Database>,
    /// Owner, as persisted on init; never changes afterwards
    owner: Identity,
    /// Events of committed mutations
    events_tx: broadcast::Sender<LedgerEvent>,
    /// Id of the most recently created poll
    active_poll_tx: watch::Sender<PollId>,
    active_poll_rx: watch::Receiver<PollId>,
}

pub(crate) trait LedgerReadDbOps {
    fn get_db_version(&self) -> DbResult<Option<u64>>;
    fn get_owner(&self) -> DbResult<Option<Identity>>;
    fn get_active_poll_id(&self) -> DbResult<PollId>;
    fn get_last_poll_id(&self) -> DbResult<PollId>;
    fn get_poll(&self, poll_id: PollId) -> DbResult<Option<PollRecord>>;
    fn get_polls(&self) -> DbResult<Vec<PollRecord>>;
    fn has_voted(&self, poll_id: PollId, voter: Identity) -> DbResult<bool>;
    fn get_voters(&self, poll_id: PollId) -> DbResult<Vec<Identity>>;
}

pub(crate) trait LedgerWriteDbOps {
    fn set_db_version(&self, version: u64) -> DbResult<()>;
    fn insert_owner(&self, owner: Identity) -> DbResult<InsertOutcome<Identity>>;
    fn set_active_poll_id(&self, poll_id: PollId) -> DbResult<()>;
    fn insert_poll(&self, poll: &PollRecord) -> DbResult<InsertOutcome<PollRecord>>;
    /// Overwrite an existing poll
    fn update_poll(&self, poll: &PollRecord) -> DbResult<()>;
    fn insert_voter(&self, poll_id: PollId, voter: Identity) -> DbResult<InsertOutcome<()>>;
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum InsertOutcome<T> {
    Inserted,
    AlreadyPresent(T),
}

macro_rules! impl_ledger_read_db_ops {
    ($t:ty) => {
        impl LedgerReadDbOps for $t {
            fn get_db_version(&self) -> DbResult<Option<u64>> {
                let tbl = self.open_table(&ledger_db_version::TABLE)?;

                Ok(tbl.get(&())?.map(|g| g.value()))
            }

            fn get_owner(&self) -> DbResult<Option<Identity>> {
                let tbl = self.open_table(&ledger_owner::TABLE)?;

                Ok(tbl.get(&())?.map(|g| g.value()))
            }

            fn get_active_poll_id(&self) -> DbResult<PollId> {
                let tbl = self.open_table(&ledger_active_poll::TABLE)?;

                Ok(tbl.get(&())?.map(|g| g.value()).unwrap_or_default())
            }

            fn get_last_poll_id(&self) -> DbResult<PollId> {
                let tbl = self.open_table(&ledger_polls::TABLE)?;

                Ok(get_last_in_range(&tbl, ..)?
                    .map(|(k, _)| k)
                    .unwrap_or_default())
            }

            fn get_poll(&self, poll_id: PollId) -> DbResult<Option<PollRecord>> {
                let tbl = self.open_table(&ledger_polls::TABLE)?;
                if let Some(v) = tbl.get(&poll_id)? {
                    let v = v.value();
                    assert_eq!(v.id, poll_id);

                    return Ok(Some(v));
                }

                Ok(None)
            }

            fn get_polls(&self) -> DbResult<Vec<PollRecord>> {
                let tbl = self.open_table(&ledger_polls::TABLE)?;

                Ok(tbl
                    .range(..)?
                    .map(|kv| kv.map(|(_, v)| v.value()))
                    .collect::<Result<Vec<_>, _>>()?)
            }

            fn has_voted(&self, poll_id: PollId, voter: Identity) -> DbResult<bool> {
                let tbl = self.open_table(&ledger_poll_voters::TABLE)?;

                Ok(tbl.get(&(poll_id, voter))?.is_some())
            }

            fn get_voters(&self, poll_id: PollId) -> DbResult<Vec<Identity>> {
                let mut voters = vec![];
                let tbl = self.open_table(&ledger_poll_voters::TABLE)?;

                for kv in tbl.range((poll_id, Identity::MIN)..=(poll_id, Identity::MAX))? {
                    let (k, _) = kv?;

                    voters.push(k.value().1);
                }

                Ok(voters)
            }
        }
    };
}
impl_ledger_read_db_ops!(ReadTransaction);
impl_ledger_read_db_ops!(WriteTransactionCtx);

impl LedgerWriteDbOps for WriteTransactionCtx {
    fn set_db_version(&self, version: u64) -> DbResult<()> {
        let mut tbl = self.open_table(&ledger_db_version::TABLE)?;

        tbl.insert(&(), &version)?;
        Ok(())
    }

    fn insert_owner(&self, owner: Identity) -> DbResult<InsertOutcome<Identity>> {
        let mut tbl = self.open_table(&ledger_owner::TABLE)?;

        if let Some(existing) = tbl.get(&())?.map(|g| g.value()) {
            return Ok(InsertOutcome::AlreadyPresent(existing));
        }

        tbl.insert(&(), &owner)?;
        Ok(InsertOutcome::Inserted)
    }

    fn set_active_poll_id(&self, poll_id: PollId) -> DbResult<()> {
        let mut tbl = self.open_table(&ledger_active_poll::TABLE)?;

        tbl.insert(&(), &poll_id)?;
        Ok(())
    }

    fn insert_poll(&self, poll: &PollRecord) -> DbResult<InsertOutcome<PollRecord>> {
        let mut tbl = self.open_table(&ledger_polls::TABLE)?;

        if let Some(existing) = tbl.get(&poll.id)?.map(|g| g.value()) {
            return Ok(InsertOutcome::AlreadyPresent(existing));
        }

        tbl.insert(&poll.id, poll)?;
        Ok(InsertOutcome::Inserted)
    }

    fn update_poll(&self, poll: &PollRecord) -> DbResult<()> {
        let mut tbl = self.open_table(&ledger_polls::TABLE)?;

        let prev = tbl.insert(&poll.id, poll)?.map(|g| g.value());
        assert!(prev.is_some(), "Can only update existing polls");
        Ok(())
    }

    fn insert_voter(&self, poll_id: PollId, voter: Identity) -> DbResult<InsertOutcome<()>> {
        let mut tbl = self.open_table(&ledger_poll_voters::TABLE)?;

        if tbl.insert(&(poll_id, voter), &())?.is_some() {
            return Ok(InsertOutcome::AlreadyPresent(()));
        }
        Ok(InsertOutcome::Inserted)
    }
}

impl Ledger {
    fn ensure_owner(&self, caller: Identity) -> LedgerResult<()> {
        if caller != self.owner {
            debug!(target: LOG_TARGET, caller = %caller.to_short(), "Caller is not the owner");
            return UnauthorizedSnafu { caller }.fail();
        }
        Ok(())
    }

    /// Broadcast `event` once `dbtx` is committed
    fn notify_on_commit(&self, dbtx: &WriteTransactionCtx, event: LedgerEvent) {
        let events_tx = self.events_tx.clone();
        dbtx.on_commit(move || {
            // No subscribers is fine
            let _ = events_tx.send(event);
        });
    }
}
