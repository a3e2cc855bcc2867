//! # Dashboard Controller
//!
//! One [`Dashboard`] per open dashboard view. It owns the view's
//! [`DashboardState`], its relief form and its [`ViewScope`], and runs the
//! overview's actions through the [`CredentialWorkflow`].
//!
//! Locks are `parking_lot` and are never held across `.await`. Results
//! are applied to the state under the state lock after checking the
//! scope, and [`Dashboard::close`] takes the same lock, so nothing lands
//! in the state once the view is closed.
//!
//! Credential issuance holds the view's issuance slot for its whole
//! round trip. A second invocation while the slot is taken is refused
//! with [`DashboardError::ActionUnavailable`].

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use samriddhi_core::{CaseReliefRecord, CredentialBundle, UserId, UserProfile};
use samriddhi_issuance_client::CredentialIssuer;
use samriddhi_store::ProfileRepository;

use crate::error::DashboardError;
use crate::form::{ReliefSink, VerificationForm};
use crate::scope::ViewScope;
use crate::view::{ActionEffect, ActionKind, DashboardState, DashboardTab};
use crate::workflow::CredentialWorkflow;

/// What an invoked action did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The identity was verified.
    IdentityVerified,
    /// A credential was issued and recorded. `suggested_tab` is the
    /// navigation offered afterwards, `None` if the view closed meanwhile.
    CredentialIssued {
        /// The recorded bundle.
        bundle: CredentialBundle,
        /// Offered navigation.
        suggested_tab: Option<DashboardTab>,
    },
    /// The active tab changed.
    TabChanged(DashboardTab),
    /// The card has no backend behaviour.
    Acknowledged,
}

/// State and actions of one dashboard view.
#[derive(Debug)]
pub struct Dashboard<R, I> {
    workflow: CredentialWorkflow<R, I>,
    user: UserId,
    state: Mutex<DashboardState>,
    form: Mutex<VerificationForm>,
    scope: ViewScope,
    issuing: AtomicBool,
}

/// Holds the view's issuance slot; releases it on drop.
struct IssuanceSlot<'a>(&'a AtomicBool);

impl<'a> IssuanceSlot<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for IssuanceSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<R: ProfileRepository, I: CredentialIssuer> Dashboard<R, I> {
    /// Open a view for `user`. The profile is not loaded until
    /// [`refresh`](Self::refresh).
    pub fn open(workflow: CredentialWorkflow<R, I>, user: UserId) -> Self {
        Self {
            workflow,
            user,
            state: Mutex::new(DashboardState::new()),
            form: Mutex::new(VerificationForm::new()),
            scope: ViewScope::new(),
            issuing: AtomicBool::new(false),
        }
    }

    /// The user this view belongs to.
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// A copy of the current state.
    pub fn state(&self) -> DashboardState {
        self.state.lock().clone()
    }

    /// The view's cancellation scope.
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Close the view. In-flight reads are dropped and late results are
    /// discarded.
    pub fn close(&self) {
        let _state = self.state.lock();
        self.scope.close();
        tracing::debug!(user_id = %self.user, "dashboard view closed");
    }

    /// Whether a credential issuance is in flight for this view.
    pub fn issuing(&self) -> bool {
        self.issuing.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), DashboardError> {
        if self.scope.is_closed() {
            Err(DashboardError::ViewClosed)
        } else {
            Ok(())
        }
    }

    /// Store `profile` in the view unless it has closed. Returns whether it
    /// was applied.
    fn apply_profile(&self, profile: UserProfile) -> bool {
        let mut state = self.state.lock();
        if self.scope.is_closed() {
            tracing::debug!(user_id = %self.user, "discarding profile for closed view");
            return false;
        }
        state.set_profile(Some(profile));
        true
    }

    /// Load the profile into the view.
    ///
    /// # Errors
    ///
    /// [`DashboardError::ViewClosed`] if the view closed before or during
    /// the read; [`DashboardError::Store`] if the read failed.
    pub async fn refresh(&self) -> Result<(), DashboardError> {
        let fetched = self
            .scope
            .run(self.workflow.repository().get(&self.user))
            .await
            .map_err(|_| DashboardError::ViewClosed)??;

        let mut state = self.state.lock();
        if self.scope.is_closed() {
            return Err(DashboardError::ViewClosed);
        }
        state.set_profile(fetched);
        Ok(())
    }

    /// Switch tabs by name.
    pub fn select_tab(&self, name: &str) -> DashboardTab {
        self.state.lock().select_named(name)
    }

    /// Accept the navigation offered after issuance.
    pub fn follow_suggestion(&self) -> Option<DashboardTab> {
        self.state.lock().follow_suggestion()
    }

    /// Invoke an overview action card.
    ///
    /// # Errors
    ///
    /// [`DashboardError::ActionUnavailable`] if the card is disabled or
    /// completed, otherwise whatever the action's workflow step returns.
    pub async fn invoke(&self, action: ActionKind) -> Result<ActionOutcome, DashboardError> {
        self.ensure_open()?;
        let card = self.state.lock().action_card(action);
        if !card.invocable() {
            return Err(DashboardError::ActionUnavailable(action));
        }

        match action.effect() {
            ActionEffect::VerifyIdentity => {
                let profile = self.workflow.verify_identity(&self.user).await?;
                self.apply_profile(profile);
                Ok(ActionOutcome::IdentityVerified)
            }
            ActionEffect::IssueCredential => {
                let Some(_slot) = IssuanceSlot::acquire(&self.issuing) else {
                    tracing::warn!(user_id = %self.user, "issuance already in flight");
                    return Err(DashboardError::ActionUnavailable(action));
                };
                // Writes are never scoped; an issued credential is always recorded.
                // The stored profile is checked, not the cached one, so an
                // issuance that finished meanwhile is seen as AlreadyIssued.
                let outcome = self.workflow.issue_for_user(&self.user).await?;
                let suggested_tab = if self.apply_profile(outcome.profile) {
                    let mut state = self.state.lock();
                    state.suggest(DashboardTab::GenerateDocuments);
                    state.suggested_tab()
                } else {
                    None
                };
                Ok(ActionOutcome::CredentialIssued {
                    bundle: outcome.bundle,
                    suggested_tab,
                })
            }
            ActionEffect::SwitchTab(tab) => {
                self.state.lock().select_tab(tab);
                Ok(ActionOutcome::TabChanged(tab))
            }
            ActionEffect::Informational => {
                tracing::info!(user_id = %self.user, action = action.slug(), "informational action");
                Ok(ActionOutcome::Acknowledged)
            }
        }
    }

    /// The relief form's current record.
    pub fn relief_record(&self) -> CaseReliefRecord {
        self.form.lock().record().clone()
    }

    /// Whether a relief submission is in flight.
    pub fn relief_submitting(&self) -> bool {
        self.form.lock().is_submitting()
    }

    /// Write one relief form input.
    pub fn set_relief_field(&self, name: &str, value: &str) -> Result<(), DashboardError> {
        self.form.lock().set_field(name, value)?;
        Ok(())
    }

    /// Write a batch of relief form inputs; a refused input leaves the
    /// form as it was.
    pub fn set_relief_fields<'a, F>(&self, inputs: F) -> Result<(), DashboardError>
    where
        F: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.form.lock().set_fields(inputs)?;
        Ok(())
    }

    /// Submit the relief form to `sink` and, once accepted, mark the
    /// user's info as captured.
    ///
    /// # Errors
    ///
    /// [`DashboardError::Form`] for refused or failed submissions;
    /// [`DashboardError::Store`] if the flag could not be raised.
    pub async fn submit_relief<S: ReliefSink>(&self, sink: &S) -> Result<(), DashboardError> {
        self.ensure_open()?;
        let (guard, record) = self.form.lock().begin_submit()?;
        sink.submit(&record).await?;
        self.form.lock().finish_submit(guard);
        tracing::info!(user_id = %self.user, fir_number = %record.fir_number, "relief record submitted");

        let profile = self.workflow.record_info_captured(&self.user).await?;
        self.apply_profile(profile);
        Ok(())
    }
}

impl<R, I> Drop for Dashboard<R, I> {
    fn drop(&mut self) {
        self.scope.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FormError, IssuanceError};
    use samriddhi_core::{AccessToken, ProfileField, ProfileUpdate};
    use samriddhi_issuance_client::{IssuanceApiError, IssueVcRequest};
    use samriddhi_store::{InMemoryProfileRepository, StoreError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedIssuer {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CredentialIssuer for FixedIssuer {
        async fn issue(&self, _request: &IssueVcRequest) -> Result<CredentialBundle, IssuanceApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(CredentialBundle {
                vc_id: "V1".into(),
                issuer_did: "did:x".into(),
                subject_did: "did:y".into(),
                qr_code: "Q".into(),
                document_url: "U".into(),
                verify_url: "W".into(),
                access_token: AccessToken::new("T"),
                credential: serde_json::Value::Null,
            })
        }

        fn portal_origin(&self) -> String {
            "http://127.0.0.1:8080".into()
        }
    }

    /// Repository whose reads take `delay`.
    #[derive(Clone, Default)]
    struct SlowRepo {
        inner: InMemoryProfileRepository,
        delay: Duration,
    }

    impl ProfileRepository for SlowRepo {
        async fn get(&self, user: &UserId) -> Result<Option<UserProfile>, StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.get(user).await
        }

        async fn merge(&self, user: &UserId, update: ProfileUpdate) -> Result<UserProfile, StoreError> {
            self.inner.merge(user, update).await
        }
    }

    struct AcceptSink(AtomicUsize);

    impl ReliefSink for AcceptSink {
        async fn submit(&self, _record: &CaseReliefRecord) -> Result<(), FormError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
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

    fn open_with(
        read_delay: Duration,
        issue_delay: Duration,
    ) -> (Dashboard<SlowRepo, FixedIssuer>, SlowRepo, Arc<FixedIssuer>) {
        let repo = SlowRepo {
            inner: InMemoryProfileRepository::new(),
            delay: read_delay,
        };
        repo.inner.insert(uid(), ready_profile());
        let issuer = Arc::new(FixedIssuer {
            calls: AtomicUsize::new(0),
            delay: issue_delay,
        });
        let wf = CredentialWorkflow::new(Arc::new(repo.clone()), Arc::clone(&issuer));
        (Dashboard::open(wf, uid()), repo, issuer)
    }

    fn open(delay: Duration) -> (Dashboard<SlowRepo, FixedIssuer>, SlowRepo, Arc<FixedIssuer>) {
        open_with(delay, Duration::ZERO)
    }

    #[tokio::test]
    async fn ekyc_then_issue_walks_the_gates() {
        let (dash, repo, issuer) = open(Duration::ZERO);
        dash.refresh().await.unwrap();
        assert_eq!(dash.state().status_indicators()[0].value, "Pending");

        let err = dash.invoke(ActionKind::VerifyRecords).await.unwrap_err();
        assert!(matches!(err, DashboardError::ActionUnavailable(ActionKind::VerifyRecords)));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);

        assert_eq!(
            dash.invoke(ActionKind::InitiateEkyc).await.unwrap(),
            ActionOutcome::IdentityVerified
        );
        assert_eq!(dash.state().status_indicators()[0].value, "Verified");

        let outcome = dash.invoke(ActionKind::VerifyRecords).await.unwrap();
        assert!(matches!(
            outcome,
            ActionOutcome::CredentialIssued { ref bundle, suggested_tab: Some(DashboardTab::GenerateDocuments) }
                if bundle.vc_id == "V1"
        ));
        assert_eq!(dash.state().status_indicators()[1].value, "Approved");
        assert!(repo.inner.get(&uid()).await.unwrap().unwrap().credential_issued());

        // suggestion is offered, not taken
        assert_eq!(dash.state().active_tab(), DashboardTab::Overview);
        assert_eq!(dash.follow_suggestion(), Some(DashboardTab::GenerateDocuments));
    }

    #[tokio::test]
    async fn completed_step_cannot_be_invoked_again() {
        let (dash, _repo, _issuer) = open(Duration::ZERO);
        dash.refresh().await.unwrap();
        dash.invoke(ActionKind::InitiateEkyc).await.unwrap();
        assert!(matches!(
            dash.invoke(ActionKind::InitiateEkyc).await,
            Err(DashboardError::ActionUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn view_workflow_switches_to_capture_tab() {
        let (dash, _repo, _issuer) = open(Duration::ZERO);
        assert_eq!(
            dash.invoke(ActionKind::ViewWorkflow).await.unwrap(),
            ActionOutcome::TabChanged(DashboardTab::CaptureInfo)
        );
        assert_eq!(dash.state().active_tab(), DashboardTab::CaptureInfo);
    }

    #[tokio::test(start_paused = true)]
    async fn late_profile_read_never_reaches_closed_view() {
        let (dash, _repo, _issuer) = open(Duration::from_secs(5));
        let dash = Arc::new(dash);
        let closer = Arc::clone(&dash);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            closer.close();
        });

        let err = dash.refresh().await.unwrap_err();

        assert!(matches!(err, DashboardError::ViewClosed));
        assert!(dash.state().profile().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn issuance_in_flight_at_close_is_still_recorded() {
        let (dash, repo, issuer) = open_with(Duration::ZERO, Duration::from_secs(5));
        dash.refresh().await.unwrap();
        dash.invoke(ActionKind::InitiateEkyc).await.unwrap();
        let dash = Arc::new(dash);

        let closer = Arc::clone(&dash);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            closer.close();
        });

        let outcome = dash.invoke(ActionKind::VerifyRecords).await.unwrap();

        assert!(matches!(outcome, ActionOutcome::CredentialIssued { suggested_tab: None, .. }));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
        assert!(repo.inner.get(&uid()).await.unwrap().unwrap().credential_issued());
        // the closed view kept its pre-issuance profile
        assert!(!dash.state().profile().unwrap().credential_issued());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_issuance_reaches_issuer_once() {
        let (dash, repo, issuer) = open_with(Duration::ZERO, Duration::from_secs(2));
        dash.refresh().await.unwrap();
        dash.invoke(ActionKind::InitiateEkyc).await.unwrap();

        let (first, second) = tokio::join!(
            dash.invoke(ActionKind::VerifyRecords),
            dash.invoke(ActionKind::VerifyRecords)
        );

        assert!(matches!(first, Ok(ActionOutcome::CredentialIssued { .. })));
        assert!(matches!(
            second,
            Err(DashboardError::ActionUnavailable(ActionKind::VerifyRecords))
        ));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
        assert!(!dash.issuing());
        assert!(repo.inner.get(&uid()).await.unwrap().unwrap().credential_issued());

        // the completed card now refuses on its own
        assert!(matches!(
            dash.invoke(ActionKind::VerifyRecords).await,
            Err(DashboardError::ActionUnavailable(_))
        ));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_issuance_releases_the_slot() {
        let (dash, repo, issuer) = open(Duration::ZERO);
        let mut p = ready_profile();
        p.phone = None;
        repo.inner.insert(uid(), p);
        dash.refresh().await.unwrap();
        dash.invoke(ActionKind::InitiateEkyc).await.unwrap();
        assert!(dash.invoke(ActionKind::VerifyRecords).await.is_err());
        assert!(!dash.issuing());

        repo.inner
            .merge(&uid(), ProfileUpdate::default().with_field(ProfileField::Phone, "555"))
            .await
            .unwrap();
        dash.refresh().await.unwrap();

        assert!(dash.invoke(ActionKind::VerifyRecords).await.is_ok());
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_view_refuses_actions() {
        let (dash, _repo, issuer) = open(Duration::ZERO);
        dash.close();
        assert!(matches!(
            dash.invoke(ActionKind::ViewAnalytics).await,
            Err(DashboardError::ViewClosed)
        ));
        assert!(matches!(dash.refresh().await, Err(DashboardError::ViewClosed)));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn relief_submission_marks_info_captured() {
        let (dash, repo, _issuer) = open(Duration::ZERO);
        for (name, value) in [
            ("firNumber", "0123/2023"),
            ("incidentDate", "2024-03-01"),
            ("policeStation", "Civil Lines"),
            ("atrocityType", "other"),
            ("reliefStage", "second"),
            ("victimContact", "9876543210"),
            ("bankAccountSeeded", "pending"),
        ] {
            dash.set_relief_field(name, value).unwrap();
        }
        let sink = AcceptSink(AtomicUsize::new(0));

        dash.submit_relief(&sink).await.unwrap();

        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
        assert_eq!(dash.relief_record(), CaseReliefRecord::new());
        assert!(!dash.relief_submitting());
        assert!(dash.state().profile().unwrap().info_captured());
        assert!(repo.inner.get(&uid()).await.unwrap().unwrap().info_captured());
        assert!(dash.state().action_card(ActionKind::ViewWorkflow).completed);
    }

    #[tokio::test]
    async fn incomplete_relief_form_is_refused() {
        let (dash, _repo, _issuer) = open(Duration::ZERO);
        let sink = AcceptSink(AtomicUsize::new(0));
        assert!(matches!(
            dash.submit_relief(&sink).await,
            Err(DashboardError::Form(FormError::MissingFields(_)))
        ));
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn issuance_validation_error_surfaces_through_dashboard() {
        let (dash, repo, issuer) = open(Duration::ZERO);
        let mut p = UserProfile::new();
        p.full_name = Some("A".into());
        repo.inner.insert(uid(), p);
        dash.refresh().await.unwrap();
        dash.invoke(ActionKind::InitiateEkyc).await.unwrap();

        let err = dash.invoke(ActionKind::VerifyRecords).await.unwrap_err();

        assert!(matches!(
            err,
            DashboardError::Issuance(IssuanceError::MissingProfileFields { .. })
        ));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }
}
