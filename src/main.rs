use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use daycare_api::auth::directory::PgDirectory;
use daycare_api::auth::identity::GoTrueClient;
use daycare_api::database::Database;
use daycare_api::{app, email, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("daycare_api=info,tower_http=info")),
        )
        .init();

    let config = daycare_api::config::config();
    tracing::info!("Starting Daycare API in {:?} mode", config.environment);

    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    if config.database.run_migrations {
        db.migrate().await.context("failed to run migrations")?;
    }

    let state = AppState {
        db: db.clone(),
        identity: Arc::new(GoTrueClient::new(&config.identity)),
        directory: Arc::new(PgDirectory::new(db.clone())),
        mailer: email::build_mailer(&config.email),
        config: Arc::new(config.clone()),
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Daycare API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
