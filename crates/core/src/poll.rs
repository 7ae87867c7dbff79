use ballot_util_array_type::{array_type_fixed_size_define, array_type_fixed_size_impl_serde};
use bincode::{Decode, Encode};
use convi::CastInto as _;
use serde::{Deserialize, Serialize};
use snafu::{Snafu, ensure};

use crate::{MAX_OPTIONS, MIN_OPTIONS};


array_type_fixed_size_define! {
    /// Poll number
    ///
    /// Assigned sequentially starting from `1`. [`PollId::ZERO`] is never
    /// assigned to a poll and stands for "no poll".
    ///
    /// It's fixed size encoded, so database keys sort numerically.
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct PollId(u64);
}
array_type_fixed_size_impl_serde!(PollId);

impl PollId {
    pub const FIRST: Self = Self::new(1);

    pub fn is_none(self) -> bool {
        self == Self::ZERO
    }
}

/// Index of an option within a poll
pub type OptionIdx = u8;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum PollInputError {
    #[snafu(display("Question must not be empty"))]
    EmptyQuestion,
    #[snafu(display("Poll needs between {MIN_OPTIONS} and {MAX_OPTIONS} options, got {len}"))]
    OptionsCount { len: usize },
    #[snafu(display("Option {idx} is empty"))]
    EmptyOption { idx: usize },
}

pub type PollInputResult<T> = Result<T, PollInputError>;

/// Validated input of a new poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPoll {
    pub question: String,
    /// Options, with surrounding whitespace trimmed
    pub options: Vec<String>,
}

impl NewPoll {
    pub fn new(question: &str, options: &[impl AsRef<str>]) -> PollInputResult<Self> {
        ensure!(!question.trim().is_empty(), EmptyQuestionSnafu);
        ensure!(
            (MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()),
            OptionsCountSnafu { len: options.len() }
        );

        let options = options
            .iter()
            .enumerate()
            .map(|(idx, option)| -> PollInputResult<String> {
                let option = option.as_ref().trim();
                ensure!(!option.is_empty(), EmptyOptionSnafu { idx });
                Ok(option.to_owned())
            })
            .collect::<PollInputResult<Vec<_>>>()?;

        Ok(Self {
            question: question.to_owned(),
            options,
        })
    }
}

/// A poll, as stored in the ledger
///
/// `tally[i]` is the number of votes for `options[i]`; the two always
/// have the same length. Who voted is tracked separately by the ledger.
#[derive(Encode, Decode, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PollRecord {
    pub id: PollId,
    pub question: String,
    pub options: Vec<String>,
    pub tally: Vec<u64>,
    pub active: bool,
}

impl PollRecord {
    pub fn new(id: PollId, poll: NewPoll) -> Self {
        debug_assert!(!id.is_none());
        let tally = vec![0; poll.options.len()];
        Self {
            id,
            question: poll.question,
            options: poll.options,
            tally,
            active: true,
        }
    }

    /// What's reported when no poll was ever created
    pub fn none() -> Self {
        Self {
            id: PollId::ZERO,
            question: String::new(),
            options: vec![],
            tally: vec![],
            active: false,
        }
    }

    pub fn is_none(&self) -> bool {
        self.id.is_none()
    }

    /// Convert `idx` to an [`OptionIdx`] if it refers to one of the options
    pub fn option_idx(&self, idx: i64) -> Option<OptionIdx> {
        let idx = usize::try_from(idx).ok()?;
        if self.options.len() <= idx {
            return None;
        }
        OptionIdx::try_from(idx).ok()
    }

    pub fn record_vote(&mut self, idx: OptionIdx) {
        let idx: usize = idx.cast_into();
        debug_assert_eq!(self.options.len(), self.tally.len());
        let count = &mut self.tally[idx];
        *count = count.checked_add(1).expect("Can't overflow u64 votes");
    }

    pub fn total_votes(&self) -> u64 {
        self.tally.iter().sum()
    }
}
