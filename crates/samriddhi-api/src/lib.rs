//! # samriddhi-api: Axum API Service for the SAMRIDDHI Portal
//!
//! HTTP surface of the portal dashboard. Every signed-in user gets one
//! dashboard view held in [`state::AppState`]; the routes read and drive it.
//!
//! ## API Surface
//!
//! | Path                       | Module                  | Purpose                    |
//! |----------------------------|-------------------------|----------------------------|
//! | `/v1/dashboard*`           | [`routes::dashboard`]   | Overview, tabs             |
//! | `/v1/actions/:action`      | [`routes::dashboard`]   | Action cards               |
//! | `/v1/profile`              | [`routes::profile`]     | Profile tab, edits         |
//! | `/v1/relief-form`          | [`routes::relief`]      | Relief form draft          |
//! | `/v1/relief-records`       | [`routes::relief`]      | Relief submission          |
//! | `/v1/session/sign-out`     | [`routes::session`]     | Sign-out                   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → SessionMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the session middleware
/// so they remain accessible without a session.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::dashboard::router())
        .merge(routes::profile::router())
        .merge(routes::relief::router())
        .merge(routes::session::router())
        .layer(from_fn_with_state(state.clone(), auth::session_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
