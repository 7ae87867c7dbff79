use std::sync::{Arc, Mutex};
use std::{ops, result};

use redb_bincode::{WriteTransaction, redb};

/// A write transaction that can carry hooks to run after it commits
///
/// Anything observable outside the database (notifications, watch
/// channels) must only happen once the changes are durable, so callers
/// register it via [`WriteTransactionCtx::on_commit`] instead of doing it
/// inline. If the transaction is dropped without commit, hooks are
/// dropped too.
pub struct WriteTransactionCtx {
    commit_hook_order_lock: Arc<Mutex<()>>,
    dbtx: WriteTransaction,
    on_commit: Mutex<Vec<Box<dyn FnOnce() + 'static>>>,
}

impl WriteTransactionCtx {
    pub fn new(dbtx: WriteTransaction, commit_hook_order_lock: Arc<Mutex<()>>) -> Self {
        Self {
            dbtx,
            on_commit: Mutex::new(vec![]),
            commit_hook_order_lock,
        }
    }
}

impl ops::Deref for WriteTransactionCtx {
    type Target = WriteTransaction;

    fn deref(&self) -> &Self::Target {
        &self.dbtx
    }
}

impl ops::DerefMut for WriteTransactionCtx {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.dbtx
    }
}

impl WriteTransactionCtx {
    pub fn on_commit(&self, f: impl FnOnce() + 'static) {
        self.on_commit
            .lock()
            .expect("Locking failed")
            .push(Box::new(f));
    }

    pub(crate) fn commit(self) -> result::Result<(), redb::CommitError> {
        let Self {
            dbtx,
            on_commit,
            commit_hook_order_lock,
        } = self;

        // Only one write transaction exists at a time, but once it's committed
        // the next one can start, and without this lock its hooks could run
        // before ours.
        let _guard = commit_hook_order_lock.lock().expect("Can't fail");

        dbtx.commit()?;

        for hook in on_commit.lock().expect("Locking failed").drain(..) {
            hook();
        }
        Ok(())
    }
}
