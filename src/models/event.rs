// src/models/event.rs
//! Registry notifications.
//!
//! Events are appended to the registry's log inside the same transition that
//! produced them and are broadcast to live subscribers only after commit.

use crate::models::identity::Identity;
use crate::models::profile::Profile;
use crate::models::record::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A state change observable by external consumers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RegistryEvent {
    DegreeIssued {
        record_id: RecordId,
        subject: Identity,
        issuer: Identity,
        degree_name: String,
    },
    WorkExperienceIssued {
        record_id: RecordId,
        subject: Identity,
        issuer: Identity,
        company_name: String,
        role: String,
    },
    ProfileUpdated {
        subject: Identity,
        profile: Profile,
    },
}

/// An event as stored in the append-only log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: RegistryEvent,
}
