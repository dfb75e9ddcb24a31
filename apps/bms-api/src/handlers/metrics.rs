//! Telemetry 指标快照。
//!
//! - GET /metrics（仅 admin）

use api_contract::MetricsResponse;
use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use bms_telemetry::metrics;

use crate::utils::response::forbidden_error;
use crate::{AppState, middleware::require_session};

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match require_session(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    if !ctx.role.can_view_metrics() {
        return forbidden_error();
    }

    let snapshot = metrics().snapshot();
    Json(MetricsResponse {
        device_fetches: snapshot.device_fetches,
        device_fetch_failures: snapshot.device_fetch_failures,
        cache_hits: snapshot.cache_hits,
        cache_joins: snapshot.cache_joins,
        device_writes: snapshot.device_writes,
        device_write_failures: snapshot.device_write_failures,
        setpoint_verify_failures: snapshot.setpoint_verify_failures,
        setpoint_unlock_attempts: snapshot.setpoint_unlock_attempts,
        timers_fired: snapshot.timers_fired,
        timer_command_failures: snapshot.timer_command_failures,
    })
    .into_response()
}
