// src/contracts/record_store.rs
//! Write-once storage of issued records.
//!
//! Presence is map membership: a record with every field empty is still
//! found, and an id that was never written is always `NotFound`.

use crate::error::{RegistryError, Result};
use crate::models::record::{Degree, RecordId, RecordKind, WorkExperience};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    degrees: BTreeMap<RecordId, Degree>,
    work_experiences: BTreeMap<RecordId, WorkExperience>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` is taken by a record of either kind.
    pub fn contains(&self, id: RecordId) -> bool {
        self.degrees.contains_key(&id) || self.work_experiences.contains_key(&id)
    }

    /// Writes a degree under a fresh id.
    ///
    /// # Errors
    /// `DuplicateRecord` if `id` is already used by any record.
    pub fn insert_degree(&mut self, id: RecordId, degree: Degree) -> Result<()> {
        if self.contains(id) {
            return Err(RegistryError::DuplicateRecord(id));
        }
        self.degrees.insert(id, degree);
        Ok(())
    }

    /// Writes a work-experience record under a fresh id.
    ///
    /// # Errors
    /// `DuplicateRecord` if `id` is already used by any record.
    pub fn insert_work_experience(&mut self, id: RecordId, record: WorkExperience) -> Result<()> {
        if self.contains(id) {
            return Err(RegistryError::DuplicateRecord(id));
        }
        self.work_experiences.insert(id, record);
        Ok(())
    }

    pub fn degree(&self, id: RecordId) -> Result<&Degree> {
        self.degrees.get(&id).ok_or(RegistryError::NotFound {
            kind: RecordKind::Degree,
            id,
        })
    }

    pub fn work_experience(&self, id: RecordId) -> Result<&WorkExperience> {
        self.work_experiences.get(&id).ok_or(RegistryError::NotFound {
            kind: RecordKind::WorkExperience,
            id,
        })
    }
}
