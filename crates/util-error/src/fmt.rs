// SPDX-License-Identifier: MIT

//! Compact, single-line formatting of errors with their source chain
//!
//! Meant for structured logging: `err = %err.fmt_compact()`.

use std::error::Error;
use std::fmt;

pub struct CompactError<'e, E: ?Sized>(&'e E);

impl<E> fmt::Display for CompactError<'_, E>
where
    E: Error + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0, f)?;

        let mut source = self.0.source();
        while let Some(err) = source {
            f.write_str(": ")?;
            fmt::Display::fmt(err, f)?;
            source = err.source();
        }
        Ok(())
    }
}

pub trait FmtCompact {
    fn fmt_compact(&self) -> CompactError<'_, Self>;
}

impl<E> FmtCompact for E
where
    E: Error + ?Sized,
{
    fn fmt_compact(&self) -> CompactError<'_, Self> {
        CompactError(self)
    }
}

#[cfg(test)]
mod tests {
    use snafu::{ResultExt as _, Snafu};

    use super::FmtCompact as _;

    #[derive(Debug, Snafu)]
    #[snafu(display("inner failure"))]
    struct Inner;

    #[derive(Debug, Snafu)]
    #[snafu(display("outer failure"))]
    struct Outer {
        source: Inner,
    }

    #[test]
    fn fmt_compact_includes_sources() {
        let err = Err::<(), _>(Inner).context(OuterSnafu).unwrap_err();

        assert_eq!(err.fmt_compact().to_string(), "outer failure: inner failure");
        assert_eq!(Inner.fmt_compact().to_string(), "inner failure");
    }
}
