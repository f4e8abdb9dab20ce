// src/storage/state_file.rs
//! Durable snapshot storage for the registry state.
//!
//! The whole [`CredentialRegistry`] is written as one JSON document. Writes
//! go to a sibling temporary file first and are then renamed over the
//! snapshot, so a crash mid-write never leaves a torn file behind.

use crate::contracts::credential_registry::CredentialRegistry;
use crate::error::Result;
use crate::utils::serialization::{deserialize, serialize};
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-backed snapshot of the registry.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StateFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot.
    ///
    /// # Returns
    /// - `Ok(None)` if no snapshot has been written yet
    /// - `Ok(Some(state))` on success
    /// - `Err` if the file exists but cannot be read or decoded
    pub async fn load(&self) -> Result<Option<CredentialRegistry>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state = deserialize(&bytes)?;
        debug!("loaded registry snapshot from {}", self.path.display());
        Ok(Some(state))
    }

    /// Atomically replaces the snapshot with `state`.
    pub async fn save(&self, state: &CredentialRegistry) -> Result<()> {
        let bytes = serialize(state)?;
        let tmp = self.path.with_extension("tmp");

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::Identity;

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("registry.json"));

        assert!(file.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("nested").join("registry.json"));
        let admin = Identity::from_low_u64(1);
        let mut state = CredentialRegistry::new(admin);
        state
            .grant_employer(admin, Identity::from_low_u64(2), "Acme".into())
            .unwrap();

        file.save(&state).await.unwrap();
        let loaded = file.load().await.unwrap().unwrap();

        assert_eq!(loaded, state);
        assert!(!file.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, b"not json").unwrap();

        assert!(StateFile::new(path).load().await.is_err());
    }
}
