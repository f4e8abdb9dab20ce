// src/models/record.rs
//! Credential record data model.
//!
//! Two kinds of non-transferable record exist: academic degrees issued by
//! universities and work-experience attestations issued by employers. Both
//! share one identifier space ([`RecordId`]) and are immutable once written.
//!
//! All text fields are opaque; the registry never validates their format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique record identifier, allocated at issuance starting from 1.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// First identifier handed out by a fresh registry.
    pub const FIRST: RecordId = RecordId(1);

    /// The identifier following this one.
    pub fn next(self) -> RecordId {
        RecordId(self.0 + 1)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminates the two record families.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Degree,
    WorkExperience,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Degree => write!(f, "degree"),
            RecordKind::WorkExperience => write!(f, "work experience"),
        }
    }
}

/// An issued academic degree.
///
/// `university_name` is copied from the issuer's registered display name at
/// the moment of issuance and never from caller input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Degree {
    pub student_name: String,
    #[serde(rename = "studentID")]
    pub student_id: String,
    pub university_name: String,
    pub degree_name: String,
    pub major: String,
    pub issue_date: String,
}

/// An issued work-experience attestation.
///
/// `company_name` is copied from the employer's registered display name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub user_name: String,
    pub company_name: String,
    pub role: String,
    pub start_date: String,
    pub end_date: String,
    pub employer_comments: String,
}

/// Caller-supplied fields of a degree issuance.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DegreeRequest {
    pub student_name: String,
    #[serde(rename = "studentID")]
    pub student_id: String,
    pub degree_name: String,
    pub major: String,
    pub issue_date: String,
}

impl DegreeRequest {
    /// Binds the request to the issuing university's registered name.
    pub fn into_degree(self, university_name: String) -> Degree {
        Degree {
            student_name: self.student_name,
            student_id: self.student_id,
            university_name,
            degree_name: self.degree_name,
            major: self.major,
            issue_date: self.issue_date,
        }
    }
}

/// Caller-supplied fields of a work-experience issuance.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperienceRequest {
    pub user_name: String,
    pub role: String,
    pub start_date: String,
    pub end_date: String,
    pub employer_comments: String,
}

impl WorkExperienceRequest {
    /// Binds the request to the issuing employer's registered name.
    pub fn into_work_experience(self, company_name: String) -> WorkExperience {
        WorkExperience {
            user_name: self.user_name,
            company_name,
            role: self.role,
            start_date: self.start_date,
            end_date: self.end_date,
            employer_comments: self.employer_comments,
        }
    }
}

/// One line of a subject's ownership index.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipEntry {
    pub kind: RecordKind,
    pub record_id: RecordId,
}
