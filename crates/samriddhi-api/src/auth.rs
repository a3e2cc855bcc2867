//! # Session Middleware
//!
//! Resolves the `Authorization: Bearer <token>` header through the
//! configured [`AuthService`] and injects a [`CurrentSession`] into the
//! request extensions. Handlers extract it via the `FromRequestParts` impl.
//!
//! Requests without a live session are answered with 401 before any
//! handler runs, so no dashboard data is produced for signed-out callers.

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use samriddhi_core::UserId;
use samriddhi_store::{AuthError, AuthService, Session, SessionToken};

use crate::error::{AppError, ErrorBody, ErrorDetail};
use crate::state::AppState;

/// The signed-in caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    /// Resolved session.
    pub session: Session,
    /// The bearer token the session was resolved from.
    pub token: SessionToken,
}

impl CurrentSession {
    /// The signed-in user.
    pub fn user_id(&self) -> &UserId {
        &self.session.user_id
    }

    /// The signed-in user's email, if the session carries one.
    pub fn email(&self) -> Option<&str> {
        self.session.email.as_deref()
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no session in request context".into()))
    }
}

/// Pull the token out of a `Bearer` authorization header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Authenticate the request's bearer token and attach the session.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        Some(value) => match bearer_token(value) {
            Some(token) => token.to_string(),
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                return unauthorized_response("authorization header must use Bearer scheme");
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            return unauthorized_response("missing authorization header");
        }
    };

    match state.auth.authenticate(&token).await {
        Ok(session) => {
            request.extensions_mut().insert(CurrentSession {
                session,
                token: SessionToken::new(token),
            });
            next.run(request).await
        }
        Err(AuthError::InvalidSession) => {
            tracing::warn!("authentication failed: unknown or expired session");
            unauthorized_response("session is not valid")
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
