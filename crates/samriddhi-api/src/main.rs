//! # samriddhi-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the portal dashboard.
//! Binds to configurable port (default 8080).

use samriddhi_api::state::{AppConfig, AppState, LogFormat, ReliefInbox};
use samriddhi_issuance_client::IssuanceClient;
use samriddhi_store::{InMemoryProfileRepository, PgProfileRepository, ProfileBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration errors are reported by main's return before logging is up.
    let config = AppConfig::from_env()?;

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    // Profile store: PostgreSQL when DATABASE_URL is set, otherwise in memory.
    let profiles = match samriddhi_store::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })? {
        Some(pool) => ProfileBackend::Postgres(PgProfileRepository::new(pool)),
        None => ProfileBackend::Memory(InMemoryProfileRepository::new()),
    };
    tracing::info!(backend = profiles.name(), "profile store ready");

    let issuer = IssuanceClient::new(config.issuance.clone()).map_err(|e| {
        tracing::error!("Failed to create issuance client: {e}");
        e
    })?;

    let auth = config.auth_backend().map_err(|e| {
        tracing::error!("Failed to create authentication client: {e}");
        e
    })?;
    tracing::info!(backend = auth.name(), "session service ready");

    let state = AppState::new(profiles, issuer, auth)
        .with_relief_inbox(ReliefInbox::with_capacity(config.relief_capacity));
    let app = samriddhi_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("SAMRIDDHI API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
