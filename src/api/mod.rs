//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timer", get(timer_handler))
        .route("/timer/preset/:preset", post(select_preset_handler))
        .route("/timer/saved/:id/select", post(select_saved_handler))
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/toggle", post(toggle_handler))
        .route("/timer/stop", post(stop_handler))
        .route("/timer/reset", post(reset_handler))
        .route("/timer/leave", post(leave_handler))
        .route("/timer/custom", put(custom_time_handler))
        .route("/timer/label", put(label_handler))
        .route("/timer/save", post(save_handler))
        .route("/timers/saved", get(saved_timers_handler))
        .route("/timers/saved/:id/edit", post(edit_handler))
        .route("/timers/saved/:id", delete(delete_handler))
        .route("/presets", get(presets_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
