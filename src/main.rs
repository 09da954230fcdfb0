//! Sandglass - A state-managed HTTP server around a pausable countdown timer
//!
//! This is the main entry point for the sandglass application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use sandglass::{
    api::create_router,
    config::Config,
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("sandglass={},tower_http=info", config.log_level()))
        .init();

    info!("Starting sandglass server v0.1.0");
    info!(
        "Configuration: host={}, port={}, countdown={}s",
        config.host, config.port, config.seconds
    );

    // Create application state with an idle countdown armed
    let state = Arc::new(AppState::new(config.port, config.host.clone(), config.seconds));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start    - Start the countdown (optional {{\"seconds\": n}} body)");
    info!("  POST /pause    - Pause the running countdown");
    info!("  POST /resume   - Resume a paused countdown");
    info!("  POST /abort    - Cancel the countdown early");
    info!("  POST /seconds  - Reconfigure the countdown length while idle");
    info!("  GET  /status   - Check current countdown and server status");
    info!("  GET  /health   - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Give the observer a terminal event if a countdown is still live
    let phase = state.timer_snapshot().phase;
    if !phase.is_terminal() && state.abort().is_ok() {
        info!("Countdown ({}) aborted for shutdown", phase);
    }

    info!("Server shutdown complete");
    Ok(())
}
