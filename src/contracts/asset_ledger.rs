// src/contracts/asset_ledger.rs
//! Non-transferable asset ledger.
//!
//! Allocates one id per minted asset, in strictly increasing order starting at
//! [`RecordId::FIRST`], and binds it to its owner for good. There is no
//! transfer or burn path.

use crate::error::{RegistryError, Result};
use crate::models::identity::Identity;
use crate::models::record::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetLedger {
    next_id: RecordId,
    owners: BTreeMap<RecordId, Identity>,
    balances: BTreeMap<Identity, u64>,
}

impl Default for AssetLedger {
    fn default() -> Self {
        Self {
            next_id: RecordId::FIRST,
            owners: BTreeMap::new(),
            balances: BTreeMap::new(),
        }
    }
}

impl AssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next successful mint will receive. Does not allocate.
    pub fn peek_next_id(&self) -> RecordId {
        self.next_id
    }

    /// Mints the next id to `owner` and advances the counter.
    ///
    /// # Errors
    /// `InvalidSubject` if `owner` is the null identity; the counter is left
    /// untouched.
    pub fn mint(&mut self, owner: Identity) -> Result<RecordId> {
        if owner.is_zero() {
            return Err(RegistryError::InvalidSubject);
        }
        let id = self.next_id;
        self.owners.insert(id, owner);
        *self.balances.entry(owner).or_insert(0) += 1;
        self.next_id = id.next();
        Ok(id)
    }

    /// Owner of a minted asset, `None` if the id was never minted.
    pub fn owner_of(&self, id: RecordId) -> Option<Identity> {
        self.owners.get(&id).copied()
    }

    pub fn balance_of(&self, owner: &Identity) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u64 {
        self.owners.len() as u64
    }
}
