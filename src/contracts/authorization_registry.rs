// src/contracts/authorization_registry.rs
//! Issuer authorization registry.
//!
//! Maps an issuer identity to the display name it issues under. An identity is
//! authorized exactly when a non-empty name is stored for it. One registry
//! exists per record kind, so an identity can be a university, an employer,
//! both, or neither.

use crate::models::identity::Identity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRegistry {
    names: BTreeMap<Identity, String>,
}

impl AuthorizationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `display_name` for `issuer`, replacing any previous entry.
    ///
    /// An empty name clears the entry, since an empty name is the
    /// unauthorized state.
    pub fn grant(&mut self, issuer: Identity, display_name: String) {
        if display_name.is_empty() {
            self.names.remove(&issuer);
        } else {
            self.names.insert(issuer, display_name);
        }
    }

    /// Clears the entry for `issuer`. Revoking an unknown issuer is a no-op.
    pub fn revoke(&mut self, issuer: &Identity) {
        self.names.remove(issuer);
    }

    pub fn is_authorized(&self, identity: &Identity) -> bool {
        self.display_name(identity).is_some()
    }

    /// Registered display name, if the identity is authorized.
    pub fn display_name(&self, identity: &Identity) -> Option<&str> {
        self.names
            .get(identity)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}
