use ballot_core::event::LedgerEvent;
use ballot_core::identity::Identity;
use ballot_db::ctx::WriteTransactionCtx;
use ballot_db::error::{DbTxError, TxSnafu};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{Level, debug, instrument};

use super::{InsertOutcome, Ledger, LedgerReadDbOps as _, LedgerWriteDbOps as _};
use crate::{
    DuplicateVoteSnafu, InvalidOptionSnafu, LOG_TARGET, LedgerError, LedgerResult,
    NoActivePollSnafu,
};

impl Ledger {
    /// Cast `caller`'s vote for option `option_idx` of the active poll
    ///
    /// Anyone can vote, but only once per poll.
    pub async fn vote(&self, caller: Identity, option_idx: i64) -> LedgerResult<()> {
        self.db
            .write_with_expect_falliable(|dbtx| self.vote_tx(dbtx, caller, option_idx))
            .await
    }

    #[instrument(skip_all,
        fields(
            caller = %caller.to_short(),
            option_idx = %option_idx,
        ),
        ret(level = Level::DEBUG))]
    fn vote_tx(
        &self,
        dbtx: &WriteTransactionCtx,
        caller: Identity,
        option_idx: i64,
    ) -> Result<(), DbTxError<LedgerError>> {
        let poll_id = dbtx.get_active_poll_id()?;
        let mut poll = dbtx
            .get_poll(poll_id)?
            .filter(|poll| poll.active)
            .context(NoActivePollSnafu)
            .context(TxSnafu)?;

        let idx = poll
            .option_idx(option_idx)
            .context(InvalidOptionSnafu {
                poll_id,
                option_idx,
                num_options: poll.options.len(),
            })
            .context(TxSnafu)?;

        if let InsertOutcome::AlreadyPresent(()) = dbtx.insert_voter(poll_id, caller)? {
            return DuplicateVoteSnafu {
                poll_id,
                voter: caller,
            }
            .fail()
            .context(TxSnafu);
        }

        poll.record_vote(idx);
        dbtx.update_poll(&poll)?;

        debug!(
            target: LOG_TARGET,
            poll_id = %poll_id,
            voter = %caller.to_short(),
            option_idx = idx,
            total_votes = poll.total_votes(),
            "Vote recorded"
        );

        self.notify_on_commit(
            dbtx,
            LedgerEvent::Voted {
                poll_id,
                voter: caller,
                option_idx: idx,
            },
        );

        Ok(())
    }
}
