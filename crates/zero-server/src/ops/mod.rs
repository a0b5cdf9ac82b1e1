//! Operational HTTP endpoints and process lifecycle.
//!
//! - health path (default `/health`): 200 with host/build info, 500 once draining
//! - `/metrics`: Prometheus text format

pub mod health;
pub mod shutdown;
pub mod signals;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use zero_core::ZeroError;

use crate::api::respond::ErrorResponse;
use crate::app_state::AppState;

use self::health::{format_uptime, HealthStatus};

const STARTED_AT_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthStatus>, ErrorResponse> {
    if !state.health().is_healthy() {
        return Err(ZeroError::Unavailable("server in graceful shutdown mode".into()).into());
    }

    Ok(Json(HealthStatus {
        build_info: state.build_info().clone(),
        hostname: state.hostname().to_string(),
        uptime: format_uptime(state.uptime()),
        started_at: state.started_at().format(STARTED_AT_FORMAT).to_string(),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.registry().render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
