//! Shift Scheduling - Axum Server
//!
//! Run with: cargo run
//! Bind address comes from `SCHEDULING_ADDR` (default 0.0.0.0:7860).

use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shift_scheduling::{api, config::ServerConfig, console};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shift_scheduling=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    console::print_banner();

    if let Err(e) = serve().await {
        error!(error = %e, "Server stopped");
        std::process::exit(1);
    }
}

async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let state = Arc::new(api::AppState::new());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
