// SPDX-License-Identifier: MIT

//! Poll ledger
//!
//! The authoritative store of polls and votes, and the rules guarding
//! them:
//!
//! * only the owner, fixed when the ledger is initialized, can create and
//!   close polls,
//! * poll ids are assigned `1, 2, 3, …`,
//! * every identity votes at most once per poll,
//! * a closed poll never reopens.
//!
//! Every mutation is a single database write transaction: it either
//! commits as a whole, or fails with a [`LedgerError`] and leaves no trace.
//! Successful mutations are announced as
//! [`LedgerEvent`](ballot_core::event::LedgerEvent)s after the commit.
//!
//! See [`tables`] module for the persisted data model.

mod error;
mod ledger;
pub mod tables;

pub use self::error::*;
pub use self::ledger::{InitError, Ledger, OpenError};

const LOG_TARGET: &str = "ballot::ledger";
