//! tasklist-api - HTTP API server for tasklist

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use tasklist_api::{
    build_rate_limiter, build_router,
    logging::{init_tracing, LogConfig},
    AppState, ServerConfig,
};
use tasklist_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let _file_guard = init_tracing(&LogConfig::from_env());
    let config = ServerConfig::from_env();

    info!(
        "Rate limiting: {} ({} requests per {} seconds)",
        if config.rate_limit_enabled {
            "enabled"
        } else {
            "disabled"
        },
        config.rate_limit_requests,
        config.rate_limit_period_secs
    );

    info!("Connecting to database...");
    let db = Database::connect_with_config(&config.database_url, config.pool_config()).await?;
    info!("Database connected");

    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let mut state = AppState::new(Arc::new(db.tasks.clone()));
    if config.rate_limit_enabled {
        match build_rate_limiter(config.rate_limit_requests, config.rate_limit_period_secs) {
            Some(limiter) => state = state.with_rate_limiter(Arc::new(limiter)),
            None => warn!("Rate limit requests and period must be non-zero; rate limiting disabled"),
        }
    }

    let app = build_router(state, &config);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
