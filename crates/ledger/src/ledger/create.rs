use ballot_core::event::LedgerEvent;
use ballot_core::identity::Identity;
use ballot_core::poll::{NewPoll, PollId, PollRecord};
use ballot_db::ctx::WriteTransactionCtx;
use ballot_db::error::{DbTxError, TxSnafu};
use snafu::ResultExt as _;
use tracing::{Level, info, instrument, warn};

use super::{InsertOutcome, Ledger, LedgerReadDbOps as _, LedgerWriteDbOps as _};
use crate::{InvalidInputSnafu, LOG_TARGET, LedgerError, LedgerResult};

impl Ledger {
    /// Create a new poll and make it the active one
    ///
    /// Only the owner can create polls. If the previously active poll is
    /// still open it is left as is: it stays open and can still be looked
    /// up by id, but no longer receives votes.
    pub async fn create(
        &self,
        caller: Identity,
        question: &str,
        options: &[impl AsRef<str>],
    ) -> LedgerResult<PollId> {
        self.db
            .write_with_expect_falliable(|dbtx| self.create_tx(dbtx, caller, question, options))
            .await
    }

    #[instrument(skip_all,
        fields(
            caller = %caller.to_short(),
            num_options = options.len(),
        ),
        ret(level = Level::DEBUG))]
    fn create_tx(
        &self,
        dbtx: &WriteTransactionCtx,
        caller: Identity,
        question: &str,
        options: &[impl AsRef<str>],
    ) -> Result<PollId, DbTxError<LedgerError>> {
        self.ensure_owner(caller).context(TxSnafu)?;

        let new_poll = NewPoll::new(question, options)
            .context(InvalidInputSnafu)
            .context(TxSnafu)?;

        let prev_poll_id = dbtx.get_active_poll_id()?;
        if let Some(prev_poll) = dbtx.get_poll(prev_poll_id)? {
            if prev_poll.active {
                warn!(
                    target: LOG_TARGET,
                    prev_poll_id = %prev_poll_id,
                    "Creating a new poll while the previous one is still open"
                );
            }
        }

        let last_poll_id = dbtx.get_last_poll_id()?;
        debug_assert_eq!(last_poll_id, prev_poll_id);
        let poll_id = last_poll_id.next().expect("Can't run out of poll ids");

        let poll = PollRecord::new(poll_id, new_poll);

        if let InsertOutcome::AlreadyPresent(existing) = dbtx.insert_poll(&poll)? {
            panic!("Poll {poll_id} already exists: {existing:?}");
        }
        dbtx.set_active_poll_id(poll_id)?;

        info!(
            target: LOG_TARGET,
            poll_id = %poll_id,
            question = %poll.question,
            "New poll created"
        );

        let active_poll_tx = self.active_poll_tx.clone();
        dbtx.on_commit(move || {
            active_poll_tx.send_replace(poll_id);
        });
        self.notify_on_commit(
            dbtx,
            LedgerEvent::Created {
                poll_id,
                question: poll.question,
                options: poll.options,
            },
        );

        Ok(poll_id)
    }
}
