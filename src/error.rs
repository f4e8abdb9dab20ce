// src/error.rs
//! Error type shared by every layer of the registry.
//!
//! Rejections (`Unauthorized`, `InvalidSubject`, `NotFound`) are raised before
//! any state is touched, so a failed call always leaves the registry exactly
//! as it was.

use crate::models::identity::Identity;
use crate::models::record::{RecordId, RecordKind};
use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Role a caller must hold for a gated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Administrator,
    University,
    Employer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Administrator => "the administrator",
            Role::University => "an authorized university",
            Role::Employer => "an authorized employer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Caller lacks the role required by the operation.
    #[error("caller {caller} is not {role}")]
    Unauthorized { caller: Identity, role: Role },

    /// Issuance subject is the null identity.
    #[error("subject identity must not be the zero address")]
    InvalidSubject,

    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: RecordId },

    /// No record of any kind carries this id.
    #[error("record {0} not found")]
    UnknownRecord(RecordId),

    /// A record with this id already exists; records are write-once.
    #[error("record {0} already exists")]
    DuplicateRecord(RecordId),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// Request body, path or query could not be decoded.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Transport-level authentication failed.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("signature error: {0}")]
    Signature(String),

    #[error("state storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}
