//! Persisted state of the ledger
//!
//! Apart from the schema version, this is exactly: the owner, the
//! pointer to the most recently created poll, and the polls themselves
//! (records and voter sets). Rows are never deleted.

use ballot_core::identity::Identity;
use ballot_core::poll::{PollId, PollRecord};
use ballot_util_db::def_table;

def_table! {
    /// Tracks ledger database/schema version
    ledger_db_version: () => u64
}

def_table! {
    /// The only identity allowed to create and close polls
    ///
    /// Written once, when the ledger is initialized.
    ledger_owner: () => Identity
}

def_table! {
    /// Id of the most recently created poll
    ///
    /// Missing (or [`PollId::ZERO`]) if no poll was created yet. Not cleared
    /// when the poll is closed.
    ledger_active_poll: () => PollId
}

def_table! {
    /// All polls ever created
    ///
    /// Append-only: entries are only updated in place (tally, `active`
    /// flag).
    ledger_polls: PollId => PollRecord
}

def_table! {
    /// Identities that voted in a given poll
    /// (poll, voter) -> ()
    ledger_poll_voters: (PollId, Identity) => ()
}
