//! 开关机日志 handlers（admin / manager）
//!
//! - `GET /power-log`：最新在前，最多 100 条
//! - `POST /power-log`：追加一条，`action` 除 `on` 外一律记为 `off`
//! - `GET /power-log/sessions`：由全部保留期内的日志还原开关机时段

use crate::AppState;
use crate::middleware::require_control;
use crate::utils::response::{
    bad_request_error, power_log_to_dto, power_session_to_dto, storage_error,
};
use api_contract::{
    CreatePowerLogRequest, OkResponse, PowerLogListResponse, PowerSessionListResponse,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use bms_storage::NewPowerLog;
use chrono::Utc;
use domain::{PowerAction, PowerTransition, derive_power_sessions};

/// 列表接口的条数上限
pub const POWER_LOG_PAGE: usize = 100;

pub async fn list_power_logs(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_control(&state, &headers) {
        return response;
    }
    match state.power_logs.list_power_logs(POWER_LOG_PAGE).await {
        Ok(items) => Json(PowerLogListResponse {
            items: items.into_iter().map(power_log_to_dto).collect(),
        })
        .into_response(),
        Err(err) => storage_error(err),
    }
}

pub async fn append_power_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreatePowerLogRequest>, JsonRejection>,
) -> Response {
    if let Err(response) = require_control(&state, &headers) {
        return response;
    }
    let Ok(Json(req)) = body else {
        return bad_request_error("bad_request");
    };
    let new = NewPowerLog {
        unit_name: req.unit_name,
        action: PowerAction::parse(&req.action),
        at: Utc::now(),
        user: req.user,
    };
    match state.power_logs.append_power_log(new).await {
        Ok(_) => Json(OkResponse::new()).into_response(),
        Err(err) => storage_error(err),
    }
}

pub async fn list_power_sessions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_control(&state, &headers) {
        return response;
    }
    let logs = match state.power_logs.list_power_logs(usize::MAX).await {
        Ok(logs) => logs,
        Err(err) => return storage_error(err),
    };
    let transitions: Vec<PowerTransition> = logs
        .into_iter()
        .map(|log| PowerTransition {
            id: log.id,
            unit_name: log.unit_name,
            action: log.action,
            at: log.at,
        })
        .collect();
    let sessions = derive_power_sessions(&transitions, Utc::now());
    Json(PowerSessionListResponse {
        items: sessions.into_iter().map(power_session_to_dto).collect(),
    })
    .into_response()
}
