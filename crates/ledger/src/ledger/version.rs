use super::Ledger;

impl Ledger {
    /// Version of the database schema this code writes
    ///
    /// Bump on incompatible changes to [`crate::tables`].
    pub const DB_VERSION: u64 = 0;
}
