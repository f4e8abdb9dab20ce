// src/services/verifier.rs
//! Credential verification service.
//!
//! Read-only access to the registry: record lookups, issuer authorization
//! checks, per-subject holdings and the event log. Every call reads one
//! consistent snapshot of the ledger.

use crate::blockchain::ledger::Ledger;
use crate::contracts::credential_registry::Holdings;
use crate::error::Result;
use crate::models::event::EventRecord;
use crate::models::identity::Identity;
use crate::models::record::{Degree, RecordId, WorkExperience};
use log::debug;
use tokio::sync::broadcast;

/// Upper bound on events returned by one `events` call.
pub const MAX_EVENT_PAGE: usize = 1000;

/// Read-side registry service.
#[derive(Clone)]
pub struct Verifier {
    ledger: Ledger,
}

impl Verifier {
    pub fn new(ledger: Ledger) -> Self {
        Verifier { ledger }
    }

    /// Profile plus every degree and work-experience record held by `subject`,
    /// each list in issuance order.
    pub async fn user_profile_and_records(&self, subject: Identity) -> Holdings {
        let holdings = self.ledger.query(|state| state.holdings(&subject)).await;
        debug!(
            "holdings of {}: {} degrees, {} work experiences",
            subject,
            holdings.degrees.len(),
            holdings.work_experiences.len()
        );
        holdings
    }

    /// # Errors
    /// `NotFound` if no degree has this id.
    pub async fn degree(&self, id: RecordId) -> Result<Degree> {
        self.ledger.query(|state| state.degree(id).cloned()).await
    }

    /// # Errors
    /// `NotFound` if no work-experience record has this id.
    pub async fn work_experience(&self, id: RecordId) -> Result<WorkExperience> {
        self.ledger
            .query(|state| state.work_experience(id).cloned())
            .await
    }

    /// Registered university name, `None` if not authorized.
    pub async fn university(&self, identity: Identity) -> Option<String> {
        self.ledger
            .query(|state| state.university_name(&identity).map(str::to_owned))
            .await
    }

    /// Registered employer name, `None` if not authorized.
    pub async fn employer(&self, identity: Identity) -> Option<String> {
        self.ledger
            .query(|state| state.employer_name(&identity).map(str::to_owned))
            .await
    }

    pub async fn is_authorized_university(&self, identity: Identity) -> bool {
        self.ledger
            .query(|state| state.is_authorized_university(&identity))
            .await
    }

    pub async fn is_authorized_employer(&self, identity: Identity) -> bool {
        self.ledger
            .query(|state| state.is_authorized_employer(&identity))
            .await
    }

    /// Owner of a record of either kind.
    pub async fn owner_of(&self, id: RecordId) -> Result<Identity> {
        self.ledger.query(|state| state.owner_of(id)).await
    }

    pub async fn balance_of(&self, owner: Identity) -> u64 {
        self.ledger.query(|state| state.balance_of(&owner)).await
    }

    pub async fn total_supply(&self) -> u64 {
        self.ledger.query(|state| state.total_supply()).await
    }

    /// Id the next successful issuance will receive.
    pub async fn next_record_id(&self) -> RecordId {
        self.ledger.query(|state| state.next_record_id()).await
    }

    pub async fn administrator(&self) -> Identity {
        self.ledger.query(|state| state.administrator()).await
    }

    /// Up to `limit` logged events starting at sequence `from`.
    pub async fn events(&self, from: u64, limit: usize) -> Vec<EventRecord> {
        let limit = limit.min(MAX_EVENT_PAGE);
        self.ledger
            .query(|state| state.events_since(from).iter().take(limit).cloned().collect())
            .await
    }

    /// Live stream of events committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.ledger.subscribe()
    }
}
