use std::error::Error;

use todoapp::app::{AppState, build_router};
use todoapp::core::config::Config;
use todoapp::core::db::create_pool_with_migrations;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("todoapp=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, token_lifetime_minutes={}, cors_origin={}",
        config.has_database(),
        config.jwt_expiration_minutes,
        config.cors_origin.as_deref().unwrap_or("*")
    );

    let state = match config.db_config() {
        Some(db_config) => {
            let pool = create_pool_with_migrations(&db_config).await?;
            tracing::info!("Connected to PostgreSQL");
            AppState::postgres(&config, pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            AppState::in_memory(&config)
        }
    };

    let app = build_router(state, &config)?;

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
