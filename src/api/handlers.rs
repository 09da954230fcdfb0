//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, response::Json};
use tracing::{info, warn};

use super::responses::{ApiResponse, HealthResponse, SecondsRequest, StatusResponse};
use crate::state::AppState;

/// Handle POST /start - Start the countdown
///
/// An optional JSON body `{"seconds": n}` overrides the countdown length;
/// after a completed or aborted run this arms a fresh countdown.
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SecondsRequest>>,
) -> Json<ApiResponse> {
    let seconds = body.map(|Json(request)| request.seconds);

    match state.start(seconds) {
        Ok(timer) => {
            info!("Start endpoint called - countdown running");
            Json(ApiResponse::applied(
                format!("Countdown started with {}s remaining", timer.remaining_seconds),
                timer,
            ))
        }
        Err(e) => {
            warn!("Start rejected: {}", e);
            Json(ApiResponse::rejected(e.to_string(), state.timer_snapshot()))
        }
    }
}

/// Handle POST /pause - Pause the running countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    match state.pause() {
        Ok(timer) => {
            info!("Pause endpoint called - countdown paused");
            Json(ApiResponse::applied(
                format!("Countdown paused with {}s remaining", timer.remaining_seconds),
                timer,
            ))
        }
        Err(e) => {
            warn!("Pause rejected: {}", e);
            Json(ApiResponse::rejected(e.to_string(), state.timer_snapshot()))
        }
    }
}

/// Handle POST /resume - Resume a paused countdown
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    match state.resume() {
        Ok(timer) => {
            info!("Resume endpoint called - countdown running");
            Json(ApiResponse::applied(
                format!("Countdown resumed with {}s remaining", timer.remaining_seconds),
                timer,
            ))
        }
        Err(e) => {
            warn!("Resume rejected: {}", e);
            Json(ApiResponse::rejected(e.to_string(), state.timer_snapshot()))
        }
    }
}

/// Handle POST /abort - Cancel the countdown before completion
pub async fn abort_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    match state.abort() {
        Ok(timer) => {
            info!("Abort endpoint called - countdown aborted");
            Json(ApiResponse::applied(
                "Countdown aborted".to_string(),
                timer,
            ))
        }
        Err(e) => {
            warn!("Abort rejected: {}", e);
            Json(ApiResponse::rejected(e.to_string(), state.timer_snapshot()))
        }
    }
}

/// Handle POST /seconds - Reconfigure the countdown length while idle
pub async fn seconds_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SecondsRequest>,
) -> Json<ApiResponse> {
    match state.reconfigure(request.seconds) {
        Ok(timer) => {
            info!("Seconds endpoint called - countdown reconfigured");
            Json(ApiResponse::applied(
                format!("Countdown length set to {}s", timer.total_seconds),
                timer,
            ))
        }
        Err(e) => {
            warn!("Reconfiguration rejected: {}", e);
            Json(ApiResponse::rejected(e.to_string(), state.timer_snapshot()))
        }
    }
}

/// Handle GET /status - Return current countdown and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.timer_snapshot(),
        last_event: state.last_event(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
