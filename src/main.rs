//! EventPass
//!
//! Main application entry point

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use eventpass::{
    config::Settings,
    database::connection::{create_pool, run_migrations, PoolConfig},
    services::mailer::mailer_from_config,
    utils::logging,
    AppState, DatabaseService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate().context("invalid configuration")?;

    // Initialize logging; the guard flushes the file writer on drop
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", eventpass::info());

    // Initialize database connection
    info!("Connecting to database...");
    let pool = create_pool(&PoolConfig::from(&settings.database)).await?;
    run_migrations(&pool).await?;
    let database_service = DatabaseService::new(pool);

    let mailer = mailer_from_config(&settings.mail)?;

    let bind_addr = settings.bind_address();
    let state = AppState::new(settings, database_service.clone(), mailer)?;

    if let Some(admin) = state.services.auth.bootstrap_admin(&state.settings.bootstrap).await? {
        info!(email = %admin.email, "Bootstrap admin account created");
    }

    let limiter = state.login_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    let app = eventpass::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!(address = %bind_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    database_service.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
