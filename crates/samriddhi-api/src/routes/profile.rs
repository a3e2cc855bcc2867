//! # Profile API
//!
//! The profile tab and identity field edits. Edits are partial merges:
//! fields absent from the request keep their stored values, and status
//! flags cannot be written through this route.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use samriddhi_core::{ProfileField, ProfileUpdate};
use samriddhi_dashboard::{DashboardState, ProfileRow};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentSession;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::dashboard::IssuedCredentialView;
use crate::state::AppState;

/// Identity field edit request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
}

impl UpdateProfileRequest {
    fn fields(&self) -> [(ProfileField, Option<&String>); 6] {
        [
            (ProfileField::FullName, self.full_name.as_ref()),
            (ProfileField::Nationality, self.nationality.as_ref()),
            (ProfileField::Phone, self.phone.as_ref()),
            (ProfileField::EmergencyContact, self.emergency_contact.as_ref()),
            (ProfileField::Address, self.address.as_ref()),
            (ProfileField::DateOfBirth, self.date_of_birth.as_ref()),
        ]
    }

    /// The merge this request describes.
    pub fn to_update(&self) -> ProfileUpdate {
        self.fields()
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v)))
            .fold(ProfileUpdate::default(), |update, (field, value)| {
                update.with_field(field, value.trim())
            })
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), String> {
        if self.fields().iter().all(|(_, value)| value.is_none()) {
            return Err("at least one profile field is required".into());
        }
        Ok(())
    }
}

/// Profile tab response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub email: Option<String>,
    pub rows: Vec<ProfileRow>,
    pub identity_verified: bool,
    pub credential_issued: bool,
    pub info_captured: bool,
    pub credential: Option<IssuedCredentialView>,
}

impl ProfileResponse {
    fn render(state: &DashboardState, caller: &CurrentSession) -> Self {
        let profile = state.profile();
        Self {
            email: caller.email().map(str::to_string),
            rows: state.profile_rows(),
            identity_verified: profile.is_some_and(|p| p.identity_verified()),
            credential_issued: profile.is_some_and(|p| p.credential_issued()),
            info_captured: profile.is_some_and(|p| p.info_captured()),
            credential: profile
                .and_then(|p| p.credential())
                .map(IssuedCredentialView::from),
        }
    }
}

/// Build the profile router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/profile", get(get_profile).patch(update_profile))
}

/// GET /v1/profile: The profile tab.
async fn get_profile(
    State(state): State<AppState>,
    caller: CurrentSession,
) -> Result<Json<ProfileResponse>, AppError> {
    let view = state.view(caller.user_id());
    view.refresh().await?;
    Ok(Json(ProfileResponse::render(&view.state(), &caller)))
}

/// PATCH /v1/profile: Merge identity fields into the stored profile.
async fn update_profile(
    State(state): State<AppState>,
    caller: CurrentSession,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let update = req.to_update();
    tracing::info!(user_id = %caller.user_id(), fields = ?update.changed_keys(), "profile update");

    state
        .workflow
        .update_profile(caller.user_id(), update)
        .await?;

    let view = state.view(caller.user_id());
    view.refresh().await?;
    Ok(Json(ProfileResponse::render(&view.state(), &caller)))
}
