//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::{debug, info};

use crate::{
    services::confirm::Confirmation,
    state::{
        preset::{catalog, PresetInfo},
        AppState, DeleteOutcome, Duration, PresetId, SaveOutcome, SavedTimerId,
    },
};
use super::responses::{
    ApiError, ApiResponse, DeleteParams, DeleteResponse, HealthResponse, LabelRequest,
    SaveRequest, SaveResponse, SavedTimersResponse, StatusResponse,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Handle GET /timer - Current timer snapshot
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.snapshot()?;
    Ok(Json(ApiResponse::ok("Current timer", timer)))
}

/// Handle GET /presets - Preset catalog
pub async fn presets_handler() -> Json<Vec<PresetInfo>> {
    Json(catalog())
}

/// Handle POST /timer/preset/:preset - Load a catalog preset
pub async fn select_preset_handler(
    State(state): State<Arc<AppState>>,
    Path(preset): Path<String>,
) -> ApiResult<ApiResponse> {
    let id: PresetId = preset.parse().map_err(|e: String| ApiError::not_found(e))?;
    let timer = state.select_preset(id)?;
    info!("Preset endpoint called - {} selected", id);
    Ok(Json(ApiResponse::ok(format!("{} selected", id.label()), timer)))
}

/// Handle POST /timer/saved/:id/select - Load a saved timer
pub async fn select_saved_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<ApiResponse> {
    let id = SavedTimerId(id);
    match state.select_saved(id)? {
        Some(timer) => Ok(Json(ApiResponse::ok(format!("Saved timer '{}' selected", timer.label), timer))),
        None => Err(ApiError::not_found(format!("No saved timer with id {}", id))),
    }
}

/// Handle POST /timer/start - Begin the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.start()?;
    if timer.running {
        Ok(Json(ApiResponse::ok("Timer started", timer)))
    } else {
        debug!("Start ignored, nothing to count down");
        Ok(Json(ApiResponse::unchanged("Set a time before starting", timer)))
    }
}

/// Handle POST /timer/pause - Freeze the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.pause()?;
    Ok(Json(ApiResponse::ok("Timer paused", timer)))
}

/// Handle POST /timer/toggle - Start/pause control
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.toggle()?;
    let message = if timer.running { "Timer started" } else { "Timer paused" };
    Ok(Json(ApiResponse::ok(message, timer)))
}

/// Handle POST /timer/stop - Reset to the initial time
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.stop()?;
    Ok(Json(ApiResponse::ok("Timer stopped", timer)))
}

/// Handle POST /timer/reset - Back to the default Pomodoro preset
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.reset_to_default()?;
    Ok(Json(ApiResponse::ok("Timer reset", timer)))
}

/// Handle POST /timer/leave - The timer view was navigated away from
pub async fn leave_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.leave_view()?;
    Ok(Json(ApiResponse::ok("Timer view left", timer)))
}

/// Handle PUT /timer/custom - Update the custom duration editor
pub async fn custom_time_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Duration>, JsonRejection>,
) -> ApiResult<ApiResponse> {
    let Json(time) = payload?;
    let timer = state.set_custom_time(time)?;
    Ok(Json(ApiResponse::ok(format!("Custom time set to {}", time), timer)))
}

/// Handle PUT /timer/label - Update the label being edited
pub async fn label_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LabelRequest>, JsonRejection>,
) -> ApiResult<ApiResponse> {
    let Json(request) = payload?;
    let timer = state.set_label(request.label)?;
    Ok(Json(ApiResponse::ok("Label updated", timer)))
}

/// Handle POST /timer/save - Save the current time under a label.
/// An empty body saves under the label already being edited.
pub async fn save_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<SaveResponse> {
    let label = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let request: SaveRequest = serde_json::from_slice(&body).map_err(|e| {
            ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid save request: {}", e))
        })?;
        request.label
    };
    let (outcome, timer) = state.save(label)?;
    let message = match outcome {
        SaveOutcome::Created(_) => "Timer saved",
        SaveOutcome::Updated(_) => "Timer updated",
    };
    Ok(Json(SaveResponse {
        response: ApiResponse::ok(message, timer),
        outcome,
    }))
}

/// Handle GET /timers/saved - List saved timers in creation order
pub async fn saved_timers_handler(State(state): State<Arc<AppState>>) -> ApiResult<SavedTimersResponse> {
    let timer = state.snapshot()?;
    Ok(Json(SavedTimersResponse {
        timers: timer.saved_timers.into_iter().map(Into::into).collect(),
    }))
}

/// Handle POST /timers/saved/:id/edit - Load a saved timer into the custom editor
pub async fn edit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<ApiResponse> {
    let timer = state.edit(SavedTimerId(id))?;
    if timer.editing == Some(SavedTimerId(id)) {
        Ok(Json(ApiResponse::ok("Editing saved timer", timer)))
    } else {
        Ok(Json(ApiResponse::unchanged("No such saved timer", timer)))
    }
}

/// Handle DELETE /timers/saved/:id?confirm=true - Remove a saved timer
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<DeleteResponse> {
    let (outcome, timer) = state.delete(SavedTimerId(id), &Confirmation(params.confirm))?;
    let response = match outcome {
        DeleteOutcome::Deleted => ApiResponse::ok("Timer deleted", timer),
        DeleteOutcome::Missing => ApiResponse::unchanged("No such saved timer", timer),
        DeleteOutcome::Declined => {
            return Err(ApiError::new(
                StatusCode::CONFLICT,
                "Confirm deletion with ?confirm=true",
            ))
        }
    };
    Ok(Json(DeleteResponse { response, outcome }))
}

/// Handle GET /status - Server and timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let timer = state.snapshot()?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        background: state.background,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
