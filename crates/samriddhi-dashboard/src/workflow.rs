//! # Credential Workflow
//!
//! validate profile → call the issuer → merge the bundle into the profile
//! store → re-read the profile.
//!
//! Checks run before anything leaves the process: a profile missing its
//! name, nationality or contact, or one that already holds a credential,
//! is turned away without a request. Once the issuer returns a complete
//! bundle the workflow writes `vcIssued`, the issuance time and every
//! artifact in one merge. A failed call writes nothing.
//!
//! The e-KYC action and the info-capture flag are plain profile merges and
//! live here too, so every profile mutation the dashboard performs goes
//! through one type.

use std::sync::Arc;

use chrono::Utc;
use samriddhi_core::{CredentialBundle, ProfileField, ProfileUpdate, UserId, UserProfile};
use samriddhi_issuance_client::{CredentialIssuer, IssueVcOptions, IssueVcRequest, QR_TYPE_PRESENTATION};
use samriddhi_store::{ProfileRepository, StoreError};

use crate::error::IssuanceError;

/// Result of a successful issuance.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuanceOutcome {
    /// The recorded bundle.
    pub bundle: CredentialBundle,
    /// The profile as re-read after the write.
    pub profile: UserProfile,
}

/// Orchestrates profile mutations that involve the issuer or status flags.
#[derive(Debug)]
pub struct CredentialWorkflow<R, I> {
    repo: Arc<R>,
    issuer: Arc<I>,
}

impl<R, I> Clone for CredentialWorkflow<R, I> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            issuer: Arc::clone(&self.issuer),
        }
    }
}

impl<R: ProfileRepository, I: CredentialIssuer> CredentialWorkflow<R, I> {
    /// Build a workflow over a repository and an issuer.
    pub fn new(repo: Arc<R>, issuer: Arc<I>) -> Self {
        Self { repo, issuer }
    }

    /// The profile repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Build the issuance request for a profile, or say why it cannot be
    /// issued.
    pub fn prepare_request(
        &self,
        user: &UserId,
        profile: &UserProfile,
    ) -> Result<IssueVcRequest, IssuanceError> {
        if profile.credential_issued() {
            return Err(IssuanceError::AlreadyIssued {
                vc_id: profile
                    .credential()
                    .map(|c| c.vc_id.clone())
                    .unwrap_or_default(),
            });
        }

        let (Some(full_name), Some(nationality), Some(contact)) = (
            profile.provided(ProfileField::FullName),
            profile.provided(ProfileField::Nationality),
            profile.issuance_contact(),
        ) else {
            return Err(IssuanceError::MissingProfileFields {
                missing: profile.missing_issuance_fields(),
            });
        };

        Ok(IssueVcRequest {
            full_name: full_name.to_string(),
            nationality: nationality.to_string(),
            emergency_contact: contact.to_string(),
            user_id: user.clone(),
            options: IssueVcOptions {
                qr_type: QR_TYPE_PRESENTATION.to_string(),
                base_url: self.issuer.portal_origin(),
            },
        })
    }

    /// Issue a credential for `profile` and record it.
    ///
    /// `profile` is the caller's view of the user's document; the checks
    /// run against it so a stale view never reaches the issuer with blank
    /// fields.
    ///
    /// # Errors
    ///
    /// See [`IssuanceError`]. Only [`IssuanceError::StoreWrite`] follows a
    /// successful remote issuance.
    pub async fn issue_credential(
        &self,
        user: &UserId,
        profile: &UserProfile,
    ) -> Result<IssuanceOutcome, IssuanceError> {
        let request = match self.prepare_request(user, profile) {
            Ok(r) => r,
            Err(e) => {
                tracing::info!(user_id = %user, error = %e, "credential issuance refused");
                return Err(e);
            }
        };

        let bundle = self.issuer.issue(&request).await.map_err(|e| {
            tracing::warn!(user_id = %user, error = %e, "credential issuance failed");
            IssuanceError::from(e)
        })?;

        let vc_id = bundle.vc_id.clone();
        let merged = self
            .repo
            .merge(user, ProfileUpdate::credential_issued(Utc::now(), bundle.clone()))
            .await
            .map_err(|source| {
                tracing::error!(
                    user_id = %user,
                    vc_id = %vc_id,
                    error = %source,
                    "credential issued but not recorded"
                );
                IssuanceError::StoreWrite {
                    vc_id: vc_id.clone(),
                    source,
                }
            })?;

        tracing::info!(user_id = %user, vc_id = %vc_id, "credential issued");
        let profile = self.reread(user, merged).await;
        Ok(IssuanceOutcome { bundle, profile })
    }

    /// Load the user's stored profile and issue against it.
    ///
    /// # Errors
    ///
    /// [`IssuanceError::StoreRead`] if the profile cannot be loaded, then
    /// as [`issue_credential`](Self::issue_credential).
    pub async fn issue_for_user(&self, user: &UserId) -> Result<IssuanceOutcome, IssuanceError> {
        let profile = self
            .repo
            .get(user)
            .await
            .map_err(IssuanceError::StoreRead)?
            .unwrap_or_default();
        self.issue_credential(user, &profile).await
    }

    /// e-KYC: mark the user's identity verified. A second call keeps the
    /// first verification time.
    pub async fn verify_identity(&self, user: &UserId) -> Result<UserProfile, StoreError> {
        let merged = self
            .repo
            .merge(user, ProfileUpdate::identity_verified(Utc::now()))
            .await?;
        tracing::info!(user_id = %user, "identity verified");
        Ok(self.reread(user, merged).await)
    }

    /// Raise the info-captured flag after a relief record was accepted.
    pub async fn record_info_captured(&self, user: &UserId) -> Result<UserProfile, StoreError> {
        let merged = self.repo.merge(user, ProfileUpdate::info_captured()).await?;
        Ok(self.reread(user, merged).await)
    }

    /// Merge user-edited identity fields.
    pub async fn update_profile(
        &self,
        user: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, StoreError> {
        let merged = self.repo.merge(user, update).await?;
        Ok(self.reread(user, merged).await)
    }

    /// Read the profile back after a write. The write already succeeded,
    /// so a failed read falls back to the merged document.
    async fn reread(&self, user: &UserId, merged: UserProfile) -> UserProfile {
        match self.repo.get(user).await {
            Ok(Some(p)) => p,
            Ok(None) => merged,
            Err(e) => {
                tracing::warn!(user_id = %user, error = %e, "profile re-read failed");
                merged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use samriddhi_core::AccessToken;
    use samriddhi_issuance_client::IssuanceApiError;
    use samriddhi_store::InMemoryProfileRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Issuer double that records requests and answers from a script.
    struct ScriptedIssuer {
        calls: AtomicUsize,
        last: Mutex<Option<IssueVcRequest>>,
        answer: fn(&IssueVcRequest) -> Result<CredentialBundle, IssuanceApiError>,
    }

    impl ScriptedIssuer {
        fn new(answer: fn(&IssueVcRequest) -> Result<CredentialBundle, IssuanceApiError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                answer,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last(&self) -> Option<IssueVcRequest> {
            self.last.lock().unwrap().clone()
        }
    }

    impl CredentialIssuer for ScriptedIssuer {
        async fn issue(&self, request: &IssueVcRequest) -> Result<CredentialBundle, IssuanceApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            (self.answer)(request)
        }

        fn portal_origin(&self) -> String {
            "https://portal.example.in".into()
        }
    }

    /// Repository double whose merges always fail.
    struct BrokenStore;

    impl ProfileRepository for BrokenStore {
        async fn get(&self, _user: &UserId) -> Result<Option<UserProfile>, StoreError> {
            Ok(None)
        }

        async fn merge(&self, _user: &UserId, _update: ProfileUpdate) -> Result<UserProfile, StoreError> {
            Err(StoreError::Unavailable("write quota exceeded".into()))
        }
    }

    fn bundle(vc_id: &str) -> CredentialBundle {
        CredentialBundle {
            vc_id: vc_id.into(),
            issuer_did: "did:x".into(),
            subject_did: "did:y".into(),
            qr_code: "data:image/png;base64,AAAA".into(),
            document_url: "https://files.example/V1.pdf".into(),
            verify_url: "https://portal.example.in/verify/V1".into(),
            access_token: AccessToken::new("jwt"),
            credential: serde_json::json!({ "type": ["VerifiableCredential"] }),
        }
    }

    fn ok_v1(_: &IssueVcRequest) -> Result<CredentialBundle, IssuanceApiError> {
        Ok(bundle("V1"))
    }

    fn rejected(_: &IssueVcRequest) -> Result<CredentialBundle, IssuanceApiError> {
        Err(IssuanceApiError::Rejected {
            error: Some("ISSUER_DOWN".into()),
            message: "issuer key unavailable".into(),
        })
    }

    fn incomplete(_: &IssueVcRequest) -> Result<CredentialBundle, IssuanceApiError> {
        Err(IssuanceApiError::IncompleteBundle {
            missing: vec!["vcPDFUrl"],
        })
    }

    fn uid() -> UserId {
        UserId::new("uid-1").unwrap()
    }

    fn ready_profile() -> UserProfile {
        let mut p = UserProfile::new();
        p.full_name = Some("A".into());
        p.nationality = Some("IN".into());
        p.phone = Some("555".into());
        p
    }

    fn setup(
        answer: fn(&IssueVcRequest) -> Result<CredentialBundle, IssuanceApiError>,
    ) -> (
        CredentialWorkflow<InMemoryProfileRepository, ScriptedIssuer>,
        Arc<ScriptedIssuer>,
        InMemoryProfileRepository,
    ) {
        let repo = InMemoryProfileRepository::new();
        let issuer = Arc::new(ScriptedIssuer::new(answer));
        let wf = CredentialWorkflow::new(Arc::new(repo.clone()), Arc::clone(&issuer));
        (wf, issuer, repo)
    }

    #[tokio::test]
    async fn scenario_phone_only_profile_issues_and_records_v1() {
        let (wf, issuer, repo) = setup(ok_v1);
        repo.insert(uid(), ready_profile());

        let out = wf.issue_credential(&uid(), &ready_profile()).await.unwrap();

        assert_eq!(out.bundle.vc_id, "V1");
        assert!(out.profile.credential_issued());
        assert!(out.profile.credential_issued_at().is_some());
        let stored = repo.get(&uid()).await.unwrap().unwrap();
        assert!(stored.credential_issued());
        assert_eq!(stored.credential(), Some(&bundle("V1")));
        assert_eq!(issuer.calls(), 1);

        let sent = issuer.last().unwrap();
        assert_eq!(sent.emergency_contact, "555");
        assert_eq!(sent.options.qr_type, "presentation");
        assert_eq!(sent.options.base_url, "https://portal.example.in");
        assert_eq!(sent.user_id, uid());
    }

    #[tokio::test]
    async fn emergency_contact_preferred_over_phone() {
        let (wf, issuer, _repo) = setup(ok_v1);
        let mut p = ready_profile();
        p.emergency_contact = Some("999".into());
        wf.issue_credential(&uid(), &p).await.unwrap();
        assert_eq!(issuer.last().unwrap().emergency_contact, "999");
    }

    #[tokio::test]
    async fn scenario_missing_nationality_makes_zero_calls() {
        let (wf, issuer, repo) = setup(ok_v1);
        let mut p = ready_profile();
        p.nationality = None;

        let err = wf.issue_credential(&uid(), &p).await.unwrap_err();

        assert!(matches!(
            err,
            IssuanceError::MissingProfileFields { ref missing }
                if missing == &[samriddhi_core::RequiredField::Nationality]
        ));
        assert_eq!(err.class(), crate::ErrorClass::Validation);
        assert_eq!(issuer.calls(), 0);
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn rejection_writes_nothing_and_retry_repeats_the_call() {
        let (wf, issuer, repo) = setup(rejected);
        repo.insert(uid(), ready_profile());

        for attempt in 1..=2 {
            let err = wf.issue_credential(&uid(), &ready_profile()).await.unwrap_err();
            assert!(matches!(err, IssuanceError::EndpointRejected(ref m) if m == "issuer key unavailable"));
            assert_eq!(issuer.calls(), attempt);
        }
        assert_eq!(repo.get(&uid()).await.unwrap(), Some(ready_profile()));
    }

    #[tokio::test]
    async fn incomplete_bundle_is_rejected_before_persistence() {
        let (wf, _issuer, repo) = setup(incomplete);
        repo.insert(uid(), ready_profile());

        let err = wf.issue_credential(&uid(), &ready_profile()).await.unwrap_err();

        assert!(matches!(err, IssuanceError::IncompleteBundle { .. }));
        assert_eq!(err.class(), crate::ErrorClass::Network);
        let stored = repo.get(&uid()).await.unwrap().unwrap();
        assert!(!stored.credential_issued());
        assert!(stored.credential().is_none());
    }

    #[tokio::test]
    async fn already_issued_profile_is_refused_without_a_call() {
        let (wf, issuer, repo) = setup(ok_v1);
        repo.insert(uid(), ready_profile());
        let first = wf.issue_credential(&uid(), &ready_profile()).await.unwrap();

        let err = wf.issue_credential(&uid(), &first.profile).await.unwrap_err();

        assert!(matches!(err, IssuanceError::AlreadyIssued { ref vc_id } if vc_id == "V1"));
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn store_failure_after_issuance_is_store_write_class() {
        let issuer = Arc::new(ScriptedIssuer::new(ok_v1));
        let wf = CredentialWorkflow::new(Arc::new(BrokenStore), Arc::clone(&issuer));

        let err = wf.issue_credential(&uid(), &ready_profile()).await.unwrap_err();

        assert!(matches!(err, IssuanceError::StoreWrite { ref vc_id, .. } if vc_id == "V1"));
        assert_eq!(err.class(), crate::ErrorClass::StoreWrite);
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn issue_for_user_reads_stored_profile() {
        let (wf, issuer, repo) = setup(ok_v1);
        let err = wf.issue_for_user(&uid()).await.unwrap_err();
        assert!(matches!(err, IssuanceError::MissingProfileFields { ref missing } if missing.len() == 3));

        repo.insert(uid(), ready_profile());
        wf.issue_for_user(&uid()).await.unwrap();
        assert_eq!(issuer.calls(), 1);
    }

    #[tokio::test]
    async fn verify_identity_is_idempotent() {
        let (wf, _issuer, _repo) = setup(ok_v1);
        let first = wf.verify_identity(&uid()).await.unwrap();
        let second = wf.verify_identity(&uid()).await.unwrap();
        assert!(second.identity_verified());
        assert_eq!(first.identity_verified_at(), second.identity_verified_at());
    }

    #[tokio::test]
    async fn info_capture_and_profile_edits_merge() {
        let (wf, _issuer, _repo) = setup(ok_v1);
        wf.update_profile(
            &uid(),
            ProfileUpdate::default().with_field(ProfileField::Address, "Jaipur"),
        )
        .await
        .unwrap();
        let p = wf.record_info_captured(&uid()).await.unwrap();
        assert!(p.info_captured());
        assert_eq!(p.address.as_deref(), Some("Jaipur"));
    }

    fn blank_or_absent() -> impl Strategy<Value = Option<String>> {
        prop_oneof![Just(None), "[ \t]{0,3}".prop_map(Some)]
    }

    fn present() -> impl Strategy<Value = Option<String>> {
        "[A-Za-z0-9]{1,8}".prop_map(Some)
    }

    proptest! {
        #[test]
        fn incomplete_profiles_never_reach_the_issuer(
            full_name in prop_oneof![blank_or_absent(), present()],
            nationality in prop_oneof![blank_or_absent(), present()],
            phone in prop_oneof![blank_or_absent(), present()],
            emergency in prop_oneof![blank_or_absent(), present()],
            address in prop_oneof![blank_or_absent(), present()],
        ) {
            let mut p = UserProfile::new();
            p.full_name = full_name;
            p.nationality = nationality;
            p.phone = phone;
            p.emergency_contact = emergency;
            p.address = address;
            prop_assume!(!p.missing_issuance_fields().is_empty());

            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (wf, issuer, repo) = setup(ok_v1);
            let result = rt.block_on(wf.issue_credential(&uid(), &p));

            let is_missing = matches!(result, Err(IssuanceError::MissingProfileFields { .. }));
            prop_assert!(is_missing);
            prop_assert_eq!(issuer.calls(), 0);
            prop_assert!(repo.is_empty());
        }

        #[test]
        fn complete_profiles_record_all_bundle_fields(
            full_name in present(),
            nationality in present(),
            phone in prop_oneof![blank_or_absent(), present()],
            emergency in present(),
        ) {
            let mut p = UserProfile::new();
            p.full_name = full_name;
            p.nationality = nationality;
            p.phone = phone;
            p.emergency_contact = emergency;

            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (wf, _issuer, repo) = setup(ok_v1);
            rt.block_on(wf.issue_credential(&uid(), &p)).unwrap();

            let stored = rt.block_on(repo.get(&uid())).unwrap().unwrap();
            prop_assert!(stored.credential_issued());
            let doc = serde_json::to_value(&stored).unwrap();
            for key in CredentialBundle::ARTIFACT_KEYS {
                let value = doc.get(key).and_then(|v| v.as_str()).unwrap_or_default();
                prop_assert!(!value.is_empty(), "{} not stored", key);
            }
        }
    }
}
