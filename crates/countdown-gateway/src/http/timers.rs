//! Timer REST endpoints under `/api/v1/timers`.
//!
//! Every handler is a one-line call into [`countdown_timers::TimerService`];
//! this module only translates JSON in and out and maps typed failures to
//! status codes:
//!
//! | TimerError        | Status |
//! |-------------------|--------|
//! | `InvalidArgument` | 400    |
//! | `NotFound`        | 404    |
//! | `InvalidState`    | 409    |
//! | `Conflict`        | 409    |
//! | `Store` (busy, closed) | 503 |
//! | `Store` (other)   | 500    |
//!
//! A request body that does not decode as `{"duration": <integer>}` is an
//! `InvalidArgument` like any other bad duration.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use countdown_timers::{Timer, TimerError, TimerId};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

use crate::app::AppState;

#[derive(Deserialize)]
pub struct DurationRequest {
    /// Seconds; must be positive.
    pub duration: i64,
}

/// JSON error body: `{"error": "...", "code": "NOT_FOUND"}`.
pub struct ApiError(TimerError);

impl From<TimerError> for ApiError {
    fn from(e: TimerError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(TimerError::InvalidArgument(rejection.body_text()))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            TimerError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            TimerError::NotFound { .. } => StatusCode::NOT_FOUND,
            TimerError::InvalidState { .. } | TimerError::Conflict { .. } => StatusCode::CONFLICT,
            TimerError::Store(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            TimerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "timer request failed");
        } else if status == StatusCode::CONFLICT {
            warn!(error = %self.0, "timer request rejected");
        }
        let body = Json(json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// POST /api/v1/timers: create an idle timer.
pub async fn create_timer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DurationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Timer>)> {
    let Json(req) = payload?;
    let timer = state.timers.create_timer(req.duration)?;
    Ok((StatusCode::CREATED, Json(timer)))
}

/// GET /api/v1/timers, newest first.
pub async fn list_timers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Timer>>> {
    Ok(Json(state.timers.list_timers()?))
}

/// GET /api/v1/timers/{id}
pub async fn get_timer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Timer>> {
    Ok(Json(state.timers.get_timer(&TimerId::from(id))?))
}

/// POST /api/v1/timers/{id}: set or revise the duration.
pub async fn update_duration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<DurationRequest>, JsonRejection>,
) -> ApiResult<Json<Timer>> {
    let Json(req) = payload?;
    Ok(Json(
        state.timers.set_duration(&TimerId::from(id), req.duration)?,
    ))
}

/// POST /api/v1/timers/{id}/start
pub async fn start_timer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Timer>> {
    Ok(Json(state.timers.start_timer(&TimerId::from(id))?))
}

/// POST /api/v1/timers/{id}/stop: pause at the current elapsed time.
pub async fn stop_timer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Timer>> {
    Ok(Json(state.timers.stop_timer(&TimerId::from(id))?))
}

/// POST /api/v1/timers/{id}/reset: back to idle with zero elapsed time.
pub async fn reset_timer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Timer>> {
    Ok(Json(state.timers.reset_timer(&TimerId::from(id))?))
}

/// POST /api/v1/timers/{id}/tick: advance a running timer by one second.
pub async fn tick_timer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Timer>> {
    Ok(Json(state.timers.tick_timer(&TimerId::from(id))?))
}
