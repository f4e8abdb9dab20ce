// src/blockchain/ledger.rs
//! Ledger substrate for the registry.
//!
//! The ledger owns the single [`CredentialRegistry`] state object and gives
//! the service layer two primitives:
//! - `transact`: run one state transition with exclusive access, persist it,
//!   then publish it. A failure at any step leaves memory, disk and the event
//!   stream exactly as they were.
//! - `query`: run a read against a consistent snapshot. Reads proceed in
//!   parallel with each other and never observe a half-applied transition.

use crate::contracts::credential_registry::CredentialRegistry;
use crate::error::Result;
use crate::models::event::EventRecord;
use crate::storage::state_file::StateFile;
use log::error;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Shared handle to the registry state.
///
/// Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct Ledger {
    state: Arc<RwLock<CredentialRegistry>>,
    /// Snapshot target; `None` keeps the registry in memory only
    state_file: Option<StateFile>,
    events: broadcast::Sender<EventRecord>,
}

impl Ledger {
    /// Wraps an existing registry state.
    ///
    /// # Arguments
    /// * `state` - Initial registry state (fresh or loaded from disk)
    /// * `state_file` - Where committed transitions are persisted
    /// * `event_buffer` - Capacity of the live event channel per subscriber
    pub fn new(state: CredentialRegistry, state_file: Option<StateFile>, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Ledger {
            state: Arc::new(RwLock::new(state)),
            state_file,
            events,
        }
    }

    /// Runs `op` as one atomic transition.
    ///
    /// Every `CredentialRegistry` operation validates before it writes, so a
    /// failing `op` leaves the state untouched. Without a snapshot target
    /// `op` runs directly on the live state. With one, `op` runs on a staged
    /// copy that replaces the live state only once the snapshot is written,
    /// so a failed write also changes nothing. Events appended by `op` are
    /// broadcast after the commit.
    ///
    /// Transitions are serialized by the write lock, so record ids are
    /// allocated in commit order.
    pub async fn transact<T>(
        &self,
        op: impl FnOnce(&mut CredentialRegistry) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.write().await;
        let first_new_event = state.events().len() as u64;

        let outcome = match &self.state_file {
            None => op(&mut *state)?,
            Some(file) => {
                let mut staged = state.clone();
                let outcome = op(&mut staged)?;
                if let Err(e) = file.save(&staged).await {
                    error!("failed to persist registry state to {}: {}", file.path().display(), e);
                    return Err(e);
                }
                *state = staged;
                outcome
            }
        };

        let published = state.events_since(first_new_event).to_vec();
        drop(state);

        for event in published {
            // No subscribers is not an error.
            let _ = self.events.send(event);
        }
        Ok(outcome)
    }

    /// Runs a read-only `op` against the current state.
    pub async fn query<T>(&self, op: impl FnOnce(&CredentialRegistry) -> T) -> T {
        let state = self.state.read().await;
        op(&state)
    }

    /// Live stream of committed events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::models::identity::Identity;
    use crate::models::profile::Profile;
    use crate::models::record::{DegreeRequest, RecordId};

    fn admin() -> Identity {
        Identity::from_low_u64(1)
    }

    #[tokio::test]
    async fn test_failed_transition_changes_nothing() {
        let ledger = Ledger::new(CredentialRegistry::new(admin()), None, 16);
        let mut events = ledger.subscribe();
        let before = ledger.query(|state| state.clone()).await;

        let result = ledger
            .transact(|state| {
                state.issue_degree(Identity::from_low_u64(9), admin(), DegreeRequest::default())
            })
            .await;

        assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
        assert_eq!(ledger.query(|state| state.clone()).await, before);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_staged_writes_are_discarded_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("registry.json"));
        let ledger = Ledger::new(CredentialRegistry::new(admin()), Some(file.clone()), 16);
        let before = ledger.query(|state| state.clone()).await;

        let result = ledger
            .transact(|state| {
                state.update_profile(Identity::from_low_u64(5), Profile::default());
                state.issue_degree(Identity::from_low_u64(9), admin(), DegreeRequest::default())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(ledger.query(|state| state.clone()).await, before);
        assert!(file.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let file = StateFile::new(blocker.join("registry.json"));
        let ledger = Ledger::new(CredentialRegistry::new(admin()), Some(file), 16);
        let mut events = ledger.subscribe();

        let university = Identity::from_low_u64(2);

        let result = ledger
            .transact(|state| state.grant_university(admin(), university, "State University".into()))
            .await;

        assert!(matches!(result, Err(RegistryError::Io(_))));
        assert!(!ledger.query(|state| state.is_authorized_university(&university)).await);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_committed_events_are_broadcast() {
        let ledger = Ledger::new(CredentialRegistry::new(admin()), None, 16);
        let mut events = ledger.subscribe();

        ledger
            .transact(|state| {
                state.update_profile(admin(), Profile::default());
                Ok(())
            })
            .await
            .unwrap();

        let received = events.recv().await.unwrap();
        assert_eq!(received.sequence, 0);
    }

    #[tokio::test]
    async fn test_transitions_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("registry.json"));
        let ledger = Ledger::new(CredentialRegistry::new(admin()), Some(file.clone()), 16);
        let university = Identity::from_low_u64(2);

        ledger
            .transact(|state| state.grant_university(admin(), university, "State University".into()))
            .await
            .unwrap();
        let id = ledger
            .transact(|state| {
                state.issue_degree(university, Identity::from_low_u64(3), DegreeRequest::default())
            })
            .await
            .unwrap();

        let reloaded = file.load().await.unwrap().unwrap();
        assert_eq!(id, RecordId(1));
        assert_eq!(reloaded.next_record_id(), RecordId(2));
        assert!(reloaded.is_authorized_university(&university));
    }

    #[tokio::test]
    async fn test_concurrent_issuance_allocates_unique_ids() {
        let ledger = Ledger::new(CredentialRegistry::new(admin()), None, 64);
        let university = Identity::from_low_u64(2);
        ledger
            .transact(|state| state.grant_university(admin(), university, "State University".into()))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for n in 0..16u64 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .transact(|state| {
                        state.issue_degree(
                            university,
                            Identity::from_low_u64(100 + n),
                            DegreeRequest::default(),
                        )
                    })
                    .await
                    .unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        let expected: Vec<_> = (1..=16).map(RecordId).collect();
        assert_eq!(ids, expected);
    }
}
