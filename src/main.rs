use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mygp_tracking::config::Config;
use mygp_tracking::handlers::{self, AppState};

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration and the holiday calendar, then
/// starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mygp_tracking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let holidays = config.holiday_provider()?;
    tracing::info!("Holiday calendar initialized");

    let port = config.port;
    let app_state = Arc::new(AppState::new(config, holidays));
    let app = handlers::router(app_state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
