use ballot_core::event::LedgerEvent;
use ballot_core::identity::Identity;
use ballot_core::poll::PollId;
use ballot_db::ctx::WriteTransactionCtx;
use ballot_db::error::{DbTxError, TxSnafu};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{Level, info, instrument};

use super::{Ledger, LedgerReadDbOps as _, LedgerWriteDbOps as _};
use crate::{LOG_TARGET, LedgerError, LedgerResult, NoActivePollSnafu};

impl Ledger {
    /// Close the active poll, freezing its tally
    ///
    /// Only the owner can close polls. Returns the id of the closed poll.
    pub async fn close(&self, caller: Identity) -> LedgerResult<PollId> {
        self.db
            .write_with_expect_falliable(|dbtx| self.close_tx(dbtx, caller))
            .await
    }

    #[instrument(skip_all, fields(caller = %caller.to_short()), ret(level = Level::DEBUG))]
    fn close_tx(
        &self,
        dbtx: &WriteTransactionCtx,
        caller: Identity,
    ) -> Result<PollId, DbTxError<LedgerError>> {
        self.ensure_owner(caller).context(TxSnafu)?;

        let poll_id = dbtx.get_active_poll_id()?;
        let mut poll = dbtx
            .get_poll(poll_id)?
            .filter(|poll| poll.active)
            .context(NoActivePollSnafu)
            .context(TxSnafu)?;

        poll.active = false;
        dbtx.update_poll(&poll)?;

        info!(
            target: LOG_TARGET,
            poll_id = %poll_id,
            total_votes = poll.total_votes(),
            "Poll closed"
        );

        self.notify_on_commit(dbtx, LedgerEvent::Closed { poll_id });

        Ok(poll_id)
    }
}
