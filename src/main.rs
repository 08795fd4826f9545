use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cms_api::config::config;
use cms_api::database::DatabaseManager;
use cms_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cms_api=info,tower_http=info")),
        )
        .init();

    let config = config();
    tracing::info!("Starting CMS API in {:?} mode", config.environment);
    if config.security.jwt_secret.trim().is_empty() {
        tracing::warn!("JWT_SECRET is not set; admin login and admin routes will fail");
    }
    if config.security.service_token.trim().is_empty() {
        tracing::warn!("CMS_SERVICE_TOKEN is not set; internal routes will reject every request");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let state = AppState::new(pool, config.clone()).context("failed to build application state")?;

    // Expired login windows are dropped in the background.
    let limiter = state.login_limiter.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            limiter.prune();
        }
    });

    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("CMS API listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;
    Ok(())
}
