//! # Session API

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use samriddhi_store::AuthService;

use crate::auth::CurrentSession;
use crate::error::AppError;
use crate::state::AppState;

/// Build the session router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/session/sign-out", post(sign_out))
}

/// POST /v1/session/sign-out: Revoke the session and close its dashboard view.
async fn sign_out(
    State(state): State<AppState>,
    caller: CurrentSession,
) -> Result<StatusCode, AppError> {
    state.auth.sign_out(caller.token.expose()).await?;
    state.views.close(caller.user_id());
    tracing::info!(user_id = %caller.user_id(), "signed out");
    Ok(StatusCode::NO_CONTENT)
}
