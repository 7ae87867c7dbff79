use ballot_core::identity::Identity;
use ballot_core::poll::{PollId, PollInputError};
use snafu::Snafu;

/// Why the ledger rejected an operation
///
/// A rejected operation has no effect on the ledger state.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LedgerError {
    #[snafu(display("Caller {caller} is not the ledger owner"))]
    Unauthorized { caller: Identity },
    #[snafu(display("Invalid poll input"))]
    InvalidInput { source: PollInputError },
    #[snafu(display("No active poll"))]
    NoActivePoll,
    #[snafu(display("Invalid option {option_idx}, poll {poll_id} has {num_options} options"))]
    InvalidOption {
        poll_id: PollId,
        option_idx: i64,
        num_options: usize,
    },
    #[snafu(display("{voter} already voted in poll {poll_id}"))]
    DuplicateVote { poll_id: PollId, voter: Identity },
    #[snafu(display("Poll {poll_id} not found"))]
    NotFound { poll_id: PollId },
}

pub type LedgerResult<T> = Result<T, LedgerError>;
