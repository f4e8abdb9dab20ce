// src/contracts/credential_registry.rs
//! Credential Registry state machine.
//!
//! [`CredentialRegistry`] owns every piece of registry state: the administrator,
//! the university and employer authorization registries, the record store,
//! the asset ledger, the per-subject ownership index, the profile store and
//! the append-only event log.
//!
//! Every mutating method takes the acting caller explicitly and performs all
//! of its checks before writing anything, so a rejected call leaves the
//! state untouched. Callers that need durability as well wrap these methods
//! in [`Ledger::transact`](crate::blockchain::ledger::Ledger::transact).

use crate::contracts::asset_ledger::AssetLedger;
use crate::contracts::authorization_registry::AuthorizationRegistry;
use crate::contracts::ownership_index::OwnershipIndex;
use crate::contracts::profile_store::ProfileStore;
use crate::contracts::record_store::RecordStore;
use crate::error::{RegistryError, Result, Role};
use crate::models::event::{EventRecord, RegistryEvent};
use crate::models::identity::Identity;
use crate::models::profile::Profile;
use crate::models::record::{
    Degree, DegreeRequest, RecordId, RecordKind, WorkExperience, WorkExperienceRequest,
};
use chrono::Utc;
use log::error;
use serde::{Deserialize, Serialize};

/// Everything a subject holds, reassembled from the ownership index.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Holdings {
    /// The subject's profile, or the default profile if never set.
    pub profile: Profile,
    /// Whether the subject ever called `update_profile`.
    pub profile_set: bool,
    /// Degrees in issuance order.
    pub degrees: Vec<Degree>,
    /// Work-experience records in issuance order.
    pub work_experiences: Vec<WorkExperience>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CredentialRegistry {
    administrator: Identity,
    universities: AuthorizationRegistry,
    employers: AuthorizationRegistry,
    records: RecordStore,
    assets: AssetLedger,
    ownership: OwnershipIndex,
    profiles: ProfileStore,
    events: Vec<EventRecord>,
}

impl CredentialRegistry {
    /// Creates an empty registry administered by `administrator`.
    pub fn new(administrator: Identity) -> Self {
        Self {
            administrator,
            universities: AuthorizationRegistry::new(),
            employers: AuthorizationRegistry::new(),
            records: RecordStore::new(),
            assets: AssetLedger::new(),
            ownership: OwnershipIndex::new(),
            profiles: ProfileStore::new(),
            events: Vec::new(),
        }
    }

    pub fn administrator(&self) -> Identity {
        self.administrator
    }

    fn require_administrator(&self, caller: Identity) -> Result<()> {
        if caller != self.administrator {
            return Err(RegistryError::Unauthorized {
                caller,
                role: Role::Administrator,
            });
        }
        Ok(())
    }

    // =====================
    // Authorization
    // =====================

    pub fn grant_university(&mut self, caller: Identity, issuer: Identity, name: String) -> Result<()> {
        self.require_administrator(caller)?;
        self.universities.grant(issuer, name);
        Ok(())
    }

    pub fn revoke_university(&mut self, caller: Identity, issuer: Identity) -> Result<()> {
        self.require_administrator(caller)?;
        self.universities.revoke(&issuer);
        Ok(())
    }

    pub fn grant_employer(&mut self, caller: Identity, issuer: Identity, name: String) -> Result<()> {
        self.require_administrator(caller)?;
        self.employers.grant(issuer, name);
        Ok(())
    }

    pub fn revoke_employer(&mut self, caller: Identity, issuer: Identity) -> Result<()> {
        self.require_administrator(caller)?;
        self.employers.revoke(&issuer);
        Ok(())
    }

    pub fn is_authorized_university(&self, identity: &Identity) -> bool {
        self.universities.is_authorized(identity)
    }

    pub fn is_authorized_employer(&self, identity: &Identity) -> bool {
        self.employers.is_authorized(identity)
    }

    pub fn university_name(&self, identity: &Identity) -> Option<&str> {
        self.universities.display_name(identity)
    }

    pub fn employer_name(&self, identity: &Identity) -> Option<&str> {
        self.employers.display_name(identity)
    }

    // =====================
    // Issuance
    // =====================

    /// Issues a degree from `caller` to `subject`.
    ///
    /// The university name is taken from the registry entry of `caller`.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not an authorized university
    /// - `InvalidSubject` if `subject` is the zero identity
    pub fn issue_degree(
        &mut self,
        caller: Identity,
        subject: Identity,
        request: DegreeRequest,
    ) -> Result<RecordId> {
        let university_name = self
            .universities
            .display_name(&caller)
            .ok_or(RegistryError::Unauthorized {
                caller,
                role: Role::University,
            })?
            .to_owned();
        if subject.is_zero() {
            return Err(RegistryError::InvalidSubject);
        }

        let degree_name = request.degree_name.clone();
        let id = self.assets.peek_next_id();
        self.records
            .insert_degree(id, request.into_degree(university_name))?;
        self.assets.mint(subject)?;
        self.ownership.append(subject, RecordKind::Degree, id);
        self.emit(RegistryEvent::DegreeIssued {
            record_id: id,
            subject,
            issuer: caller,
            degree_name,
        });
        Ok(id)
    }

    /// Issues a work-experience record from `caller` to `subject`.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not an authorized employer
    /// - `InvalidSubject` if `subject` is the zero identity
    pub fn issue_work_experience(
        &mut self,
        caller: Identity,
        subject: Identity,
        request: WorkExperienceRequest,
    ) -> Result<RecordId> {
        let company_name = self
            .employers
            .display_name(&caller)
            .ok_or(RegistryError::Unauthorized {
                caller,
                role: Role::Employer,
            })?
            .to_owned();
        if subject.is_zero() {
            return Err(RegistryError::InvalidSubject);
        }

        let role = request.role.clone();
        let id = self.assets.peek_next_id();
        self.records
            .insert_work_experience(id, request.into_work_experience(company_name.clone()))?;
        self.assets.mint(subject)?;
        self.ownership.append(subject, RecordKind::WorkExperience, id);
        self.emit(RegistryEvent::WorkExperienceIssued {
            record_id: id,
            subject,
            issuer: caller,
            company_name,
            role,
        });
        Ok(id)
    }

    // =====================
    // Profiles
    // =====================

    /// Replaces the caller's own profile.
    pub fn update_profile(&mut self, caller: Identity, profile: Profile) {
        self.profiles.set(caller, profile.clone());
        self.emit(RegistryEvent::ProfileUpdated {
            subject: caller,
            profile,
        });
    }

    // =====================
    // Reads
    // =====================

    /// Reconstructs a subject's profile and every record they hold.
    ///
    /// Records of each kind come back in issuance order. A subject with no
    /// records gets two empty lists.
    pub fn holdings(&self, subject: &Identity) -> Holdings {
        let mut degrees = Vec::new();
        let mut work_experiences = Vec::new();

        for entry in self.ownership.entries(subject) {
            let found = match entry.kind {
                RecordKind::Degree => self
                    .records
                    .degree(entry.record_id)
                    .map(|degree| degrees.push(degree.clone())),
                RecordKind::WorkExperience => self
                    .records
                    .work_experience(entry.record_id)
                    .map(|record| work_experiences.push(record.clone())),
            };
            if let Err(e) = found {
                error!("ownership index of {} is inconsistent: {}", subject, e);
            }
        }

        let stored = self.profiles.get(subject);
        Holdings {
            profile: stored.cloned().unwrap_or_default(),
            profile_set: stored.is_some(),
            degrees,
            work_experiences,
        }
    }

    pub fn degree(&self, id: RecordId) -> Result<&Degree> {
        self.records.degree(id)
    }

    pub fn work_experience(&self, id: RecordId) -> Result<&WorkExperience> {
        self.records.work_experience(id)
    }

    /// Owner of a record of either kind.
    pub fn owner_of(&self, id: RecordId) -> Result<Identity> {
        self.assets
            .owner_of(id)
            .ok_or(RegistryError::UnknownRecord(id))
    }

    pub fn balance_of(&self, owner: &Identity) -> u64 {
        self.assets.balance_of(owner)
    }

    pub fn total_supply(&self) -> u64 {
        self.assets.total_supply()
    }

    /// Id the next successful issuance will receive.
    pub fn next_record_id(&self) -> RecordId {
        self.assets.peek_next_id()
    }

    // =====================
    // Event log
    // =====================

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Events with `sequence >= from`.
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.events.len());
        &self.events[start..]
    }

    fn emit(&mut self, event: RegistryEvent) {
        let sequence = self.events.len() as u64;
        self.events.push(EventRecord {
            sequence,
            recorded_at: Utc::now(),
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity::from_low_u64(1)
    }

    fn university() -> Identity {
        Identity::from_low_u64(100)
    }

    fn employer() -> Identity {
        Identity::from_low_u64(200)
    }

    fn student() -> Identity {
        Identity::from_low_u64(300)
    }

    fn degree_request(name: &str) -> DegreeRequest {
        DegreeRequest {
            student_name: "Ada Lovelace".into(),
            student_id: "S-001".into(),
            degree_name: name.into(),
            major: "Computer Science".into(),
            issue_date: "2024-06-01".into(),
        }
    }

    fn work_request(role: &str) -> WorkExperienceRequest {
        WorkExperienceRequest {
            user_name: "Ada Lovelace".into(),
            role: role.into(),
            start_date: "2024-07-01".into(),
            end_date: "2025-07-01".into(),
            employer_comments: "Excellent".into(),
        }
    }

    fn registry_with_issuers() -> CredentialRegistry {
        let mut registry = CredentialRegistry::new(admin());
        registry
            .grant_university(admin(), university(), "State University".into())
            .unwrap();
        registry
            .grant_employer(admin(), employer(), "Acme Corp".into())
            .unwrap();
        registry
    }

    #[test]
    fn test_issue_degree_binds_university_name() {
        let mut registry = registry_with_issuers();

        let id = registry
            .issue_degree(university(), student(), degree_request("BSc CS"))
            .unwrap();

        assert_eq!(id, RecordId(1));
        let degree = registry.degree(id).unwrap();
        assert_eq!(degree.university_name, "State University");
        assert_eq!(degree.degree_name, "BSc CS");
        assert_eq!(registry.owner_of(id).unwrap(), student());
    }

    #[test]
    fn test_revoked_university_cannot_issue() {
        let mut registry = registry_with_issuers();
        registry
            .issue_degree(university(), student(), degree_request("BSc CS"))
            .unwrap();
        registry.revoke_university(admin(), university()).unwrap();
        let before = registry.clone();

        let err = registry
            .issue_degree(university(), student(), degree_request("MSc CS"))
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Unauthorized { role: Role::University, .. }
        ));
        assert_eq!(registry.next_record_id(), RecordId(2));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_only_administrator_grants() {
        let mut registry = CredentialRegistry::new(admin());
        let outsider = Identity::from_low_u64(42);

        let err = registry
            .grant_university(outsider, university(), "Fake U".into())
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Unauthorized { role: Role::Administrator, .. }
        ));
        assert!(registry.grant_employer(outsider, employer(), "Fake Co".into()).is_err());
        assert!(registry.revoke_university(outsider, university()).is_err());
        assert!(registry.revoke_employer(outsider, employer()).is_err());
        assert!(!registry.is_authorized_university(&university()));
    }

    #[test]
    fn test_holdings_preserve_issuance_order() {
        let mut registry = registry_with_issuers();
        registry
            .issue_degree(university(), student(), degree_request("BSc CS"))
            .unwrap();
        registry
            .issue_work_experience(employer(), student(), work_request("Engineer"))
            .unwrap();
        registry
            .issue_degree(university(), student(), degree_request("MSc CS"))
            .unwrap();
        registry
            .issue_degree(university(), Identity::from_low_u64(301), degree_request("BA"))
            .unwrap();

        let holdings = registry.holdings(&student());

        let names: Vec<_> = holdings.degrees.iter().map(|d| d.degree_name.as_str()).collect();
        assert_eq!(names, vec!["BSc CS", "MSc CS"]);
        assert_eq!(holdings.work_experiences.len(), 1);
        assert_eq!(holdings.work_experiences[0].company_name, "Acme Corp");
        assert_eq!(holdings.work_experiences[0].role, "Engineer");
        assert!(!holdings.profile_set);
        assert_eq!(registry.balance_of(&student()), 3);
    }

    #[test]
    fn test_holdings_of_unknown_subject_are_empty() {
        let registry = registry_with_issuers();
        let holdings = registry.holdings(&student());

        assert!(holdings.degrees.is_empty());
        assert!(holdings.work_experiences.is_empty());
        assert_eq!(holdings.profile, Profile::default());
        assert!(!holdings.profile_set);
    }

    #[test]
    fn test_unknown_degree_is_not_found() {
        let registry = registry_with_issuers();
        assert!(matches!(
            registry.degree(RecordId(999)),
            Err(RegistryError::NotFound { kind: RecordKind::Degree, id: RecordId(999) })
        ));
        assert!(matches!(
            registry.owner_of(RecordId(999)),
            Err(RegistryError::UnknownRecord(RecordId(999)))
        ));
    }

    #[test]
    fn test_ids_are_shared_and_gapless_across_kinds() {
        let mut registry = registry_with_issuers();
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(
                registry
                    .issue_degree(university(), student(), degree_request(&format!("D{}", i)))
                    .unwrap(),
            );
            ids.push(
                registry
                    .issue_work_experience(employer(), student(), work_request(&format!("R{}", i)))
                    .unwrap(),
            );
        }

        let expected: Vec<_> = (1..=6).map(RecordId).collect();
        assert_eq!(ids, expected);
        assert_eq!(registry.total_supply(), 6);
    }

    #[test]
    fn test_zero_subject_leaves_no_trace() {
        let mut registry = registry_with_issuers();
        registry
            .issue_degree(university(), student(), degree_request("BSc CS"))
            .unwrap();
        let before = registry.clone();

        let err = registry
            .issue_work_experience(employer(), Identity::zero(), work_request("Engineer"))
            .unwrap_err();

        assert!(matches!(err, RegistryError::InvalidSubject));
        assert_eq!(registry, before);

        // The failed call did not consume an id.
        let id = registry
            .issue_work_experience(employer(), student(), work_request("Engineer"))
            .unwrap();
        assert_eq!(id, RecordId(2));
    }

    #[test]
    fn test_unauthorized_checked_before_subject() {
        let mut registry = registry_with_issuers();

        // An employer is not a university; the role check wins over the bad subject.
        let err = registry
            .issue_degree(employer(), Identity::zero(), degree_request("BSc"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
        assert!(registry.events().is_empty());
    }

    #[test]
    fn test_issued_name_survives_rename_and_revoke() {
        let mut registry = registry_with_issuers();
        let first = registry
            .issue_degree(university(), student(), degree_request("BSc CS"))
            .unwrap();

        registry
            .grant_university(admin(), university(), "Renamed University".into())
            .unwrap();
        let second = registry
            .issue_degree(university(), student(), degree_request("MSc CS"))
            .unwrap();
        registry.revoke_university(admin(), university()).unwrap();

        assert_eq!(registry.degree(first).unwrap().university_name, "State University");
        assert_eq!(registry.degree(second).unwrap().university_name, "Renamed University");
    }

    #[test]
    fn test_profile_overwrite_and_event() {
        let mut registry = CredentialRegistry::new(admin());
        registry.update_profile(
            student(),
            Profile {
                name: "Ada".into(),
                skills: "Rust".into(),
                strengths: "Focus".into(),
                self_introduction: "Hi".into(),
                additional_info: "None".into(),
            },
        );
        let second = Profile {
            name: "Ada L.".into(),
            ..Profile::default()
        };
        registry.update_profile(student(), second.clone());

        let holdings = registry.holdings(&student());
        assert_eq!(holdings.profile, second);
        assert!(holdings.profile_set);
        assert_eq!(registry.events().len(), 2);
        assert_eq!(
            registry.events()[1].event,
            RegistryEvent::ProfileUpdated {
                subject: student(),
                profile: second,
            }
        );
    }

    #[test]
    fn test_issuance_events_carry_primary_fields() {
        let mut registry = registry_with_issuers();
        registry
            .issue_degree(university(), student(), degree_request("BSc CS"))
            .unwrap();
        registry
            .issue_work_experience(employer(), student(), work_request("Engineer"))
            .unwrap();

        let events: Vec<_> = registry.events().iter().map(|r| r.event.clone()).collect();
        assert_eq!(
            events,
            vec![
                RegistryEvent::DegreeIssued {
                    record_id: RecordId(1),
                    subject: student(),
                    issuer: university(),
                    degree_name: "BSc CS".into(),
                },
                RegistryEvent::WorkExperienceIssued {
                    record_id: RecordId(2),
                    subject: student(),
                    issuer: employer(),
                    company_name: "Acme Corp".into(),
                    role: "Engineer".into(),
                },
            ]
        );
        assert_eq!(registry.events_since(1).len(), 1);
        assert_eq!(registry.events_since(1)[0].sequence, 1);
        assert!(registry.events_since(50).is_empty());
    }

    #[test]
    fn test_state_survives_json_round_trip() {
        let mut registry = registry_with_issuers();
        registry
            .issue_degree(university(), student(), degree_request("BSc CS"))
            .unwrap();
        registry.update_profile(student(), Profile::default());

        let json = serde_json::to_string(&registry).unwrap();
        let restored: CredentialRegistry = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, registry);
        assert_eq!(restored.next_record_id(), RecordId(2));
    }
}
