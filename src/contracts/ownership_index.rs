// src/contracts/ownership_index.rs
//! Per-subject index of held records.
//!
//! Entries are appended in issuance order and never removed or reordered,
//! so iteration order is issuance order.

use crate::models::identity::Identity;
use crate::models::record::{OwnershipEntry, RecordId, RecordKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipIndex {
    entries: BTreeMap<Identity, Vec<OwnershipEntry>>,
}

impl OwnershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, subject: Identity, kind: RecordKind, record_id: RecordId) {
        self.entries
            .entry(subject)
            .or_default()
            .push(OwnershipEntry { kind, record_id });
    }

    /// All entries for `subject`, oldest first. Empty if none.
    pub fn entries(&self, subject: &Identity) -> &[OwnershipEntry] {
        self.entries.get(subject).map(Vec::as_slice).unwrap_or(&[])
    }
}
