// SPDX-License-Identifier: MIT

//! Error helpers shared across the ballot crates

use snafu::Snafu;

pub mod fmt;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type BoxedErrorResult<T> = std::result::Result<T, BoxedError>;
pub type WhateverResult<T> = std::result::Result<T, Whatever>;

/// Snafu's `Whatever`, but `Send + Sync`
///
/// Used at the edges (CLI, tests), where the exact error type is not
/// worth matching on.
#[derive(Debug, Snafu)]
#[snafu(whatever, display("{message}"))]
pub struct Whatever {
    #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,

    message: String,
}
