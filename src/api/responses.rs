//! API response structures

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::state::{DeleteOutcome, EngineError, SaveOutcome, SavedTimer, TimerSnapshot};

/// Response for every timer command
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

impl ApiResponse {
    pub fn new(status: &str, message: impl Into<String>, timer: TimerSnapshot) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            timer,
        }
    }

    pub fn ok(message: impl Into<String>, timer: TimerSnapshot) -> Self {
        Self::new("ok", message, timer)
    }

    /// Request accepted but nothing changed (guarded no-op)
    pub fn unchanged(message: impl Into<String>, timer: TimerSnapshot) -> Self {
        Self::new("unchanged", message, timer)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    #[serde(flatten)]
    pub response: ApiResponse,
    pub outcome: SaveOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    #[serde(flatten)]
    pub response: ApiResponse,
    pub outcome: DeleteOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedTimersResponse {
    pub timers: Vec<SavedTimerView>,
}

/// Saved timer with its compact length, e.g. `1h 30m`
#[derive(Debug, Clone, Serialize)]
pub struct SavedTimerView {
    #[serde(flatten)]
    pub timer: SavedTimer,
    pub summary: String,
}

impl From<SavedTimer> for SavedTimerView {
    fn from(timer: SavedTimer) -> Self {
        let summary = timer.time.summary();
        Self { timer, summary }
    }
}

/// Server status with the current timer
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub background: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelRequest {
    pub label: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveRequest {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
    timestamp: DateTime<Utc>,
}

/// Error returned by handlers, rendered as a JSON body
#[derive(Debug)]
pub struct ApiError {
    pub code: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Validation(v) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, v.to_string()),
            EngineError::Poisoned(_) => {
                error!("Timer engine unavailable: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

/// Malformed or out-of-range request bodies answer with the JSON error shape
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: self.message,
            timestamp: Utc::now(),
        };
        (self.code, Json(body)).into_response()
    }
}
