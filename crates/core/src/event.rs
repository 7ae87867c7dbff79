use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::poll::{OptionIdx, PollId};

/// Notification emitted by the ledger after a mutation is committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Created {
        poll_id: PollId,
        question: String,
        options: Vec<String>,
    },
    Voted {
        poll_id: PollId,
        voter: Identity,
        option_idx: OptionIdx,
    },
    Closed {
        poll_id: PollId,
    },
}

impl LedgerEvent {
    pub fn poll_id(&self) -> PollId {
        match self {
            LedgerEvent::Created { poll_id, .. }
            | LedgerEvent::Voted { poll_id, .. }
            | LedgerEvent::Closed { poll_id } => *poll_id,
        }
    }
}
