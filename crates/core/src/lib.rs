// SPDX-License-Identifier: MIT

//! Core types of the ballot ledger
//!
//! Identities, poll numbering, the stored poll record and the
//! notifications the ledger emits. Everything here is plain data with
//! encoding (`bincode` for storage, `serde` for display) and input
//! validation; the state machine itself lives in `ballot-ledger`.

pub mod event;
pub mod identity;
pub mod poll;

/// Minimum number of options a poll can have
pub const MIN_OPTIONS: usize = 2;
/// Maximum number of options a poll can have
pub const MAX_OPTIONS: usize = 5;
