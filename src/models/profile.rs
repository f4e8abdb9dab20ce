// src/models/profile.rs
//! Self-authored subject profile.

use serde::{Deserialize, Serialize};

/// Profile a subject writes about themselves.
///
/// Every update replaces the whole value; fields are never merged. Fields
/// missing from an update are stored empty.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: String,
    pub skills: String,
    pub strengths: String,
    pub self_introduction: String,
    pub additional_info: String,
}
