//! # Dashboard API
//!
//! The overview of the signed-in user's dashboard view: active tab,
//! status indicators, and the gated action cards grouped by section.
//! Action invocation runs the e-KYC and credential issuance workflows.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use samriddhi_core::CredentialBundle;
use samriddhi_dashboard::{
    ActionCard, ActionKind, ActionOutcome, ActionSection, DashboardState, DashboardTab, NavItem,
    StatusIndicator, NAV_ITEMS,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentSession;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// An action card with its derived clickability.
#[derive(Debug, Serialize)]
pub struct CardView {
    #[serde(flatten)]
    pub card: ActionCard,
    pub invocable: bool,
}

/// One section of action cards.
#[derive(Debug, Serialize)]
pub struct SectionView {
    pub section: ActionSection,
    pub heading: &'static str,
    pub cards: Vec<CardView>,
}

/// Dashboard overview response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub active_tab: DashboardTab,
    pub suggested_tab: Option<DashboardTab>,
    pub email: Option<String>,
    pub nav: Vec<NavItem>,
    pub indicators: [StatusIndicator; 4],
    pub sections: Vec<SectionView>,
}

impl DashboardResponse {
    fn render(state: &DashboardState, caller: &CurrentSession) -> Self {
        let mut sections: Vec<SectionView> = Vec::new();
        for card in state.action_cards() {
            let view = CardView {
                invocable: card.invocable(),
                card,
            };
            match sections.iter_mut().find(|s| s.section == view.card.section) {
                Some(section) => section.cards.push(view),
                None => sections.push(SectionView {
                    section: view.card.section,
                    heading: view.card.section.heading(),
                    cards: vec![view],
                }),
            }
        }

        Self {
            active_tab: state.active_tab(),
            suggested_tab: state.suggested_tab(),
            email: caller.email().map(str::to_string),
            nav: NAV_ITEMS.to_vec(),
            indicators: state.status_indicators(),
            sections,
        }
    }
}

/// Select tab request.
#[derive(Debug, Deserialize)]
pub struct SelectTabRequest {
    pub tab: String,
}

/// Public parts of an issued credential. The access token stays in the
/// profile store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredentialView {
    pub vc_id: String,
    pub issuer_did: String,
    pub qr_code: String,
    pub pdf_url: String,
    pub verify_url: String,
}

impl From<&CredentialBundle> for IssuedCredentialView {
    fn from(bundle: &CredentialBundle) -> Self {
        Self {
            vc_id: bundle.vc_id.clone(),
            issuer_did: bundle.issuer_did.clone(),
            qr_code: bundle.qr_code.clone(),
            pdf_url: bundle.document_url.clone(),
            verify_url: bundle.verify_url.clone(),
        }
    }
}

/// Result of invoking an action card.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionResponse {
    IdentityVerified,
    #[serde(rename_all = "camelCase")]
    CredentialIssued {
        credential: IssuedCredentialView,
        suggested_tab: Option<DashboardTab>,
    },
    TabChanged {
        tab: DashboardTab,
    },
    Acknowledged,
}

impl From<ActionOutcome> for ActionResponse {
    fn from(outcome: ActionOutcome) -> Self {
        match outcome {
            ActionOutcome::IdentityVerified => Self::IdentityVerified,
            ActionOutcome::CredentialIssued {
                bundle,
                suggested_tab,
            } => Self::CredentialIssued {
                credential: IssuedCredentialView::from(&bundle),
                suggested_tab,
            },
            ActionOutcome::TabChanged(tab) => Self::TabChanged { tab },
            ActionOutcome::Acknowledged => Self::Acknowledged,
        }
    }
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/dashboard", get(get_dashboard))
        .route("/v1/dashboard/tab", put(select_tab))
        .route("/v1/dashboard/suggestion", post(follow_suggestion))
        .route("/v1/actions/:action", post(invoke_action))
}

/// GET /v1/dashboard: Reload the profile and render the overview.
async fn get_dashboard(
    State(state): State<AppState>,
    caller: CurrentSession,
) -> Result<Json<DashboardResponse>, AppError> {
    let view = state.view(caller.user_id());
    view.refresh().await?;
    Ok(Json(DashboardResponse::render(&view.state(), &caller)))
}

/// PUT /v1/dashboard/tab: Switch tabs. Unknown names land on the overview.
async fn select_tab(
    State(state): State<AppState>,
    caller: CurrentSession,
    body: Result<Json<SelectTabRequest>, JsonRejection>,
) -> Result<Json<DashboardResponse>, AppError> {
    let req = extract_json(body)?;
    let view = state.view(caller.user_id());
    let tab = view.select_tab(&req.tab);
    tracing::debug!(user_id = %caller.user_id(), requested = %req.tab, tab = tab.as_str(), "tab selected");
    Ok(Json(DashboardResponse::render(&view.state(), &caller)))
}

/// POST /v1/dashboard/suggestion: Follow the navigation offered after issuance.
async fn follow_suggestion(
    State(state): State<AppState>,
    caller: CurrentSession,
) -> Result<Json<DashboardResponse>, AppError> {
    let view = state.view(caller.user_id());
    view.follow_suggestion()
        .ok_or_else(|| AppError::Conflict("no navigation is pending".into()))?;
    Ok(Json(DashboardResponse::render(&view.state(), &caller)))
}

/// POST /v1/actions/:action: Invoke an overview action card.
async fn invoke_action(
    State(state): State<AppState>,
    caller: CurrentSession,
    Path(slug): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    let action = ActionKind::from_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("action \"{slug}\"")))?;
    let view = state.view(caller.user_id());
    view.refresh().await?;
    let outcome = view.invoke(action).await?;
    Ok(Json(outcome.into()))
}
