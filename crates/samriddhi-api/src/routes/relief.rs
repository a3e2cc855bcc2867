//! # Relief Record API
//!
//! The capture-info tab's case relief form. The draft lives in the user's
//! dashboard view; inputs are written by form field name, and submission
//! hands the record to the relief inbox and raises the profile's
//! info-captured flag. A request's inputs are written together: one
//! refused input and none of them land.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use samriddhi_core::CaseReliefRecord;
use serde::Serialize;

use crate::auth::CurrentSession;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::{AppState, PortalDashboard};

/// Form inputs keyed by field name (`firNumber`, `reliefStage`, ...).
pub type ReliefInputs = BTreeMap<String, String>;

/// The relief form as the view holds it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliefFormResponse {
    pub record: CaseReliefRecord,
    pub submitting: bool,
    pub missing: Vec<&'static str>,
}

impl ReliefFormResponse {
    fn render(view: &PortalDashboard) -> Self {
        let record = view.relief_record();
        Self {
            missing: record.missing_required().iter().map(|f| f.name()).collect(),
            submitting: view.relief_submitting(),
            record,
        }
    }
}

/// Accepted submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliefSubmittedResponse {
    pub record: CaseReliefRecord,
    pub info_captured: bool,
}

/// Build the relief router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/relief-form", get(get_form).put(write_form))
        .route("/v1/relief-records", post(submit_record))
}

fn apply_inputs(view: &PortalDashboard, inputs: &ReliefInputs) -> Result<(), AppError> {
    view.set_relief_fields(inputs.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    Ok(())
}

/// GET /v1/relief-form: The current draft.
async fn get_form(
    State(state): State<AppState>,
    caller: CurrentSession,
) -> Json<ReliefFormResponse> {
    let view = state.view(caller.user_id());
    Json(ReliefFormResponse::render(&view))
}

/// PUT /v1/relief-form: Write form inputs without submitting.
async fn write_form(
    State(state): State<AppState>,
    caller: CurrentSession,
    body: Result<Json<ReliefInputs>, JsonRejection>,
) -> Result<Json<ReliefFormResponse>, AppError> {
    let inputs = extract_json(body)?;
    let view = state.view(caller.user_id());
    apply_inputs(&view, &inputs)?;
    Ok(Json(ReliefFormResponse::render(&view)))
}

/// POST /v1/relief-records: Apply any inputs in the body, then submit the draft.
async fn submit_record(
    State(state): State<AppState>,
    caller: CurrentSession,
    body: Result<Json<ReliefInputs>, JsonRejection>,
) -> Result<(StatusCode, Json<ReliefSubmittedResponse>), AppError> {
    let inputs = extract_json(body)?;
    let view = state.view(caller.user_id());
    apply_inputs(&view, &inputs)?;

    let record = view.relief_record();
    view.submit_relief(&state.relief.for_user(caller.user_id()))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReliefSubmittedResponse {
            record,
            info_captured: view
                .state()
                .profile()
                .is_some_and(|p| p.info_captured()),
        }),
    ))
}
