// HTTP request handlers
use crate::application::alarm_service::AlarmError;
use crate::application::session::SessionEvent;
use crate::domain::connection::DeviceCommand;
use crate::infrastructure::svg::{frame_to_svg, svg_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct VisibilityBody {
    pub visible: bool,
}

#[derive(Deserialize)]
pub struct ResizeBody {
    pub width: u32,
}

#[derive(Deserialize)]
pub struct AlarmBody {
    pub time: String,
    pub sunrise: u32,
}

#[derive(Deserialize)]
pub struct EnabledBody {
    pub enabled: bool,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn dispatch(state: &AppState, event: SessionEvent) -> Response {
    match state.events.send(event) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, "dashboard session has stopped"),
    }
}

fn alarm_error_response(err: AlarmError) -> Response {
    match err {
        AlarmError::Invalid(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        AlarmError::Device(e) => {
            tracing::error!(error = %e, "Device configuration request failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Connection status, latest values and update rate
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.view.borrow().clone();
    Json(view)
}

/// Current chart as SVG
pub async fn get_chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rendered = frame_to_svg(&state.view.borrow().chart);
    match rendered {
        Ok(svg) => match svg_response(svg) {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => {
            tracing::error!(error = %e, "Chart render failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Show or hide one channel
pub async fn set_visibility(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<VisibilityBody>,
) -> Response {
    let known = state.view.borrow().channels.iter().any(|c| c.key == key);
    if !known {
        return error_response(StatusCode::NOT_FOUND, format!("unknown channel {}", key));
    }
    dispatch(
        &state,
        SessionEvent::SetVisibility {
            channel: key,
            visible: body.visible,
        },
    )
}

/// Container resize
pub async fn resize_chart(State(state): State<Arc<AppState>>, Json(body): Json<ResizeBody>) -> Response {
    if body.width == 0 {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "width must be positive");
    }
    dispatch(&state, SessionEvent::Resize { width: body.width })
}

/// Drop every stored sample; the chart falls back to the placeholder
pub async fn clear_history(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, SessionEvent::ClearHistory)
}

/// Outbound device command (`registerClient`, `closeConnection`)
pub async fn send_command(Path(action): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    match DeviceCommand::from_action(&action) {
        Some(command) => dispatch(&state, SessionEvent::Command(command)),
        None => error_response(StatusCode::NOT_FOUND, format!("unknown command {}", action)),
    }
}

pub async fn get_alarm(State(state): State<Arc<AppState>>) -> Response {
    match state.alarm_service.get_alarm().await {
        Ok(alarm) => Json(alarm).into_response(),
        Err(e) => alarm_error_response(e),
    }
}

pub async fn put_alarm(State(state): State<Arc<AppState>>, Json(body): Json<AlarmBody>) -> Response {
    match state.alarm_service.set_alarm(&body.time, body.sunrise).await {
        Ok(time) => Json(serde_json::json!({
            "hours": time.hours,
            "minutes": time.minutes,
            "sunrise": body.sunrise,
        }))
        .into_response(),
        Err(e) => alarm_error_response(e),
    }
}

pub async fn put_alarm_enabled(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EnabledBody>,
) -> Response {
    match state.alarm_service.set_enabled(body.enabled).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => alarm_error_response(e),
    }
}
