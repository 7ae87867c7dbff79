use ballot_core::event::LedgerEvent;
use ballot_core::identity::Identity;
use ballot_core::poll::{PollId, PollRecord};
use ballot_db::error::TxSnafu;
use snafu::{OptionExt as _, ResultExt as _};
use tokio::sync::{broadcast, watch};

use super::{Ledger, LedgerReadDbOps as _};
use crate::{LedgerResult, NotFoundSnafu};

impl Ledger {
    pub fn owner(&self) -> Identity {
        self.owner
    }

    /// The most recently created poll, open or closed
    ///
    /// If no poll was created yet, returns [`PollRecord::none`].
    pub async fn get_active(&self) -> PollRecord {
        self.db
            .read_with_expect(|dbtx| {
                let poll_id = dbtx.get_active_poll_id()?;
                if poll_id.is_none() {
                    return Ok(PollRecord::none());
                }
                Ok(dbtx
                    .get_poll(poll_id)?
                    .expect("Active poll must be stored"))
            })
            .await
    }

    pub async fn get_by_id(&self, poll_id: PollId) -> LedgerResult<PollRecord> {
        self.db
            .read_with_expect_falliable(|dbtx| {
                dbtx.get_poll(poll_id)?
                    .context(NotFoundSnafu { poll_id })
                    .context(TxSnafu)
            })
            .await
    }

    pub async fn has_voted(&self, poll_id: PollId, voter: Identity) -> LedgerResult<bool> {
        self.db
            .read_with_expect_falliable(|dbtx| {
                if dbtx.get_poll(poll_id)?.is_none() {
                    return NotFoundSnafu { poll_id }.fail().context(TxSnafu);
                }
                Ok(dbtx.has_voted(poll_id, voter)?)
            })
            .await
    }

    /// Identities that voted in `poll_id`, in key order
    pub async fn get_voters(&self, poll_id: PollId) -> LedgerResult<Vec<Identity>> {
        self.db
            .read_with_expect_falliable(|dbtx| {
                if dbtx.get_poll(poll_id)?.is_none() {
                    return NotFoundSnafu { poll_id }.fail().context(TxSnafu);
                }
                Ok(dbtx.get_voters(poll_id)?)
            })
            .await
    }

    /// All polls, by ascending id
    pub async fn list_polls(&self) -> Vec<PollRecord> {
        self.db.read_with_expect(|dbtx| dbtx.get_polls()).await
    }

    /// Subscribe to events of all future successful mutations
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events_tx.subscribe()
    }

    pub fn active_poll_rx(&self) -> watch::Receiver<PollId> {
        self.active_poll_rx.clone()
    }
}
