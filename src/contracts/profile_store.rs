// src/contracts/profile_store.rs
//! Last-write-wins profile storage.

use crate::models::identity::Identity;
use crate::models::profile::Profile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileStore {
    profiles: BTreeMap<Identity, Profile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole profile of `subject`.
    pub fn set(&mut self, subject: Identity, profile: Profile) {
        self.profiles.insert(subject, profile);
    }

    /// `None` if the subject never set a profile.
    pub fn get(&self, subject: &Identity) -> Option<&Profile> {
        self.profiles.get(subject)
    }
}
