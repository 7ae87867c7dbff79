//! Helper for looking up the last entry of a table range

use std::ops;

use bincode::{Decode, Encode};
use redb_bincode::{ReadableTable, StorageError};

/// Last (highest key) entry in `range`, if any
pub fn get_last_in_range<K, V>(
    tbl: &impl ReadableTable<K, V>,
    range: impl ops::RangeBounds<K>,
) -> Result<Option<(K, V)>, StorageError>
where
    K: Decode<()> + Encode,
    V: Decode<()> + Encode,
{
    Ok(tbl
        .range(range)?
        .next_back()
        .transpose()?
        .map(|(k, v)| (k.value(), v.value())))
}
