// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Async façade over every state-changing registry operation:
//! - Issuer administration (grant/revoke universities and employers)
//! - Degree and work-experience issuance
//! - Profile updates
//!
//! Each call is one atomic ledger transition; a rejected call leaves no
//! trace in state, on disk or in the event stream.

use crate::blockchain::ledger::Ledger;
use crate::error::Result;
use crate::models::identity::Identity;
use crate::models::profile::Profile;
use crate::models::record::{DegreeRequest, RecordId, WorkExperienceRequest};
use log::{info, warn};

/// Service for administering issuers and issuing records.
#[derive(Clone)]
pub struct CredentialIssuer {
    ledger: Ledger,
}

impl CredentialIssuer {
    pub fn new(ledger: Ledger) -> Self {
        CredentialIssuer { ledger }
    }

    /// Authorizes `issuer` to issue degrees under `name`. Administrator only.
    pub async fn grant_university(&self, caller: Identity, issuer: Identity, name: String) -> Result<()> {
        let result = self
            .ledger
            .transact(|state| state.grant_university(caller, issuer, name.clone()))
            .await;
        log_outcome(&result, "university grant", |_| format!("granted university {} as {:?}", issuer, name));
        result
    }

    /// Withdraws degree issuance rights from `issuer`. Administrator only.
    pub async fn revoke_university(&self, caller: Identity, issuer: Identity) -> Result<()> {
        let result = self
            .ledger
            .transact(|state| state.revoke_university(caller, issuer))
            .await;
        log_outcome(&result, "university revocation", |_| format!("revoked university {}", issuer));
        result
    }

    /// Authorizes `issuer` to issue work-experience records under `name`.
    /// Administrator only.
    pub async fn grant_employer(&self, caller: Identity, issuer: Identity, name: String) -> Result<()> {
        let result = self
            .ledger
            .transact(|state| state.grant_employer(caller, issuer, name.clone()))
            .await;
        log_outcome(&result, "employer grant", |_| format!("granted employer {} as {:?}", issuer, name));
        result
    }

    /// Withdraws work-experience issuance rights from `issuer`. Administrator only.
    pub async fn revoke_employer(&self, caller: Identity, issuer: Identity) -> Result<()> {
        let result = self
            .ledger
            .transact(|state| state.revoke_employer(caller, issuer))
            .await;
        log_outcome(&result, "employer revocation", |_| format!("revoked employer {}", issuer));
        result
    }

    /// Issues a degree to `subject`; `caller` must be an authorized university.
    ///
    /// # Returns
    /// Id of the new record
    pub async fn issue_degree(
        &self,
        caller: Identity,
        subject: Identity,
        request: DegreeRequest,
    ) -> Result<RecordId> {
        let result = self
            .ledger
            .transact(|state| state.issue_degree(caller, subject, request))
            .await;
        log_outcome(&result, "degree issuance", |id| {
            format!("university {} issued degree {} to {}", caller, id, subject)
        });
        result
    }

    /// Issues a work-experience record to `subject`; `caller` must be an
    /// authorized employer.
    ///
    /// # Returns
    /// Id of the new record
    pub async fn issue_work_experience(
        &self,
        caller: Identity,
        subject: Identity,
        request: WorkExperienceRequest,
    ) -> Result<RecordId> {
        let result = self
            .ledger
            .transact(|state| state.issue_work_experience(caller, subject, request))
            .await;
        log_outcome(&result, "work experience issuance", |id| {
            format!("employer {} issued work experience {} to {}", caller, id, subject)
        });
        result
    }

    /// Replaces the caller's own profile.
    pub async fn update_profile(&self, caller: Identity, profile: Profile) -> Result<()> {
        let result = self
            .ledger
            .transact(|state| {
                state.update_profile(caller, profile);
                Ok(())
            })
            .await;
        log_outcome(&result, "profile update", |_| format!("{} updated their profile", caller));
        result
    }
}

/// Committed calls log at `info`, rejected ones at `warn`.
fn log_outcome<T>(result: &Result<T>, action: &str, committed: impl FnOnce(&T) -> String) {
    match result {
        Ok(value) => info!("{}", committed(value)),
        Err(e) => warn!("rejected {}: {}", action, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::credential_registry::CredentialRegistry;
    use crate::error::{RegistryError, Role};

    fn admin() -> Identity {
        Identity::from_low_u64(1)
    }

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new(Ledger::new(CredentialRegistry::new(admin()), None, 16))
    }

    #[tokio::test]
    async fn test_grant_requires_administrator() {
        let service = issuer();
        let outsider = Identity::from_low_u64(2);

        let err = service
            .grant_university(outsider, Identity::from_low_u64(3), "Fake U".into())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Unauthorized { role: Role::Administrator, .. }
        ));
    }

    #[tokio::test]
    async fn test_issue_after_grant() {
        let service = issuer();
        let employer = Identity::from_low_u64(3);
        service
            .grant_employer(admin(), employer, "Acme Corp".into())
            .await
            .unwrap();

        let id = service
            .issue_work_experience(employer, Identity::from_low_u64(4), WorkExperienceRequest::default())
            .await
            .unwrap();
        assert_eq!(id, RecordId(1));

        service.revoke_employer(admin(), employer).await.unwrap();
        let before = service.ledger.query(|state| state.clone()).await;

        let err = service
            .issue_work_experience(employer, Identity::from_low_u64(4), WorkExperienceRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Unauthorized { role: Role::Employer, caller } if caller == employer
        ));
        assert_eq!(service.ledger.query(|state| state.clone()).await, before);
        assert_eq!(service.ledger.query(|state| state.next_record_id()).await, RecordId(2));
    }
}
