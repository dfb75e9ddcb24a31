//! 定时任务 handlers
//!
//! - `GET /timers?chillerIp=`（兼容 `ip`）：任意已登录角色，返回当前 active 定时任务或 null
//! - `POST /timers`：admin / manager，创建定时任务
//! - `DELETE /timers?chillerIp=`：admin / manager，停用该机组的全部定时任务
//!
//! 到期执行由 `TimerScheduler` 的后台扫描负责，这里只做登记与查询。

use crate::AppState;
use crate::middleware::{require_control, require_session};
use crate::utils::response::{bad_request_error, storage_error, timer_to_dto};
use crate::utils::validation::parse_target_at;
use api_contract::{
    CreateTimerRequest, CreatedTimerResponse, OkResponse, TimerItemResponse, TimerQuery,
};
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use bms_scheduler::SchedulerError;
use bms_storage::NewTimer;
use domain::PowerAction;
use tracing::info;

pub async fn get_timer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TimerQuery>,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let Some(ip) = query.resolved_ip() else {
        return bad_request_error("bad_request");
    };
    match state.scheduler.get_active(ip).await {
        Ok(item) => Json(TimerItemResponse {
            item: item.map(timer_to_dto),
        })
        .into_response(),
        Err(err) => scheduler_error(err),
    }
}

pub async fn create_timer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateTimerRequest>, JsonRejection>,
) -> Response {
    let ctx = match require_control(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let Ok(Json(req)) = body else {
        return bad_request_error("bad_request");
    };
    if !req.hours.is_finite() || req.hours <= 0.0 {
        return bad_request_error("invalid_hours");
    }
    let Some(target_at) = parse_target_at(&req.target_at) else {
        return bad_request_error("invalid_target");
    };

    let new = NewTimer {
        chiller_name: req.chiller_name,
        chiller_ip: req.chiller_ip.trim().to_string(),
        mode: PowerAction::parse(&req.mode),
        hours: req.hours,
        target_at,
    };
    match state.scheduler.schedule(new).await {
        Ok(record) => {
            info!(
                target: "bms.api",
                timer_id = %record.id,
                chiller_ip = %record.chiller_ip,
                mode = %record.mode,
                username = %ctx.username,
                "timer_created"
            );
            Json(CreatedTimerResponse {
                ok: true,
                item: timer_to_dto(record),
            })
            .into_response()
        }
        Err(err) => scheduler_error(err),
    }
}

pub async fn delete_timers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TimerQuery>,
) -> Response {
    let ctx = match require_control(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let Some(ip) = query.resolved_ip() else {
        return bad_request_error("bad_request");
    };
    match state.scheduler.cancel(ip).await {
        Ok(cancelled) => {
            info!(target: "bms.api", chiller_ip = %ip, cancelled, username = %ctx.username, "timers_cancelled");
            Json(OkResponse::new()).into_response()
        }
        Err(err) => scheduler_error(err),
    }
}

fn scheduler_error(err: SchedulerError) -> Response {
    match err {
        SchedulerError::MissingIp => bad_request_error("bad_request"),
        SchedulerError::InvalidHours(_) => bad_request_error("invalid_hours"),
        SchedulerError::Storage(err) => storage_error(err),
    }
}
