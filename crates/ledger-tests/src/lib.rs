// SPDX-License-Identifier: MIT

//! Fixtures for `ballot-ledger` integration tests

use std::sync::Arc;

use ballot_core::identity::{Identity, IdentitySeckey};
use ballot_db::Database;
use ballot_ledger::Ledger;
use ballot_util_error::BoxedErrorResult;

pub struct Setup {
    pub db: Arc<Database>,
    pub ledger: Ledger,
    pub owner_seckey: IdentitySeckey,
}

impl Setup {
    /// Fresh ledger in an in-memory database, owned by a random identity
    pub async fn bootstrap() -> BoxedErrorResult<Self> {
        let owner_seckey = IdentitySeckey::generate();
        let db = Arc::new(Database::new_in_memory().await?);
        let ledger = Ledger::init(db.clone(), owner_seckey.pubkey()).await?;

        Ok(Self {
            db,
            ledger,
            owner_seckey,
        })
    }

    pub fn owner(&self) -> Identity {
        self.owner_seckey.pubkey()
    }

    /// Open another [`Ledger`] over the same database
    pub async fn reopen(&self) -> BoxedErrorResult<Ledger> {
        Ok(Ledger::open(self.db.clone()).await?)
    }
}

pub fn random_identity() -> Identity {
    IdentitySeckey::generate().pubkey()
}
