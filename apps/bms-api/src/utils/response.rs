//! HTTP 响应辅助函数和 DTO 转换
//!
//! 错误响应统一为 `{"ok":false,"error":"<code>"}`：
//! - forbidden_error：403 `forbidden`
//! - bad_request_error：400，错误码由调用方给出
//! - not_found_error：404 `not_found`
//! - device_error：502，设备不可达或写入失败
//! - storage_error / internal_auth_error：500 `internal_error`，同时记录日志
//!
//! DTO 转换把存储记录映射为 camelCase 契约，时间统一为毫秒精度的 RFC 3339（UTC）。

use api_contract::{ChillerDto, ErrorResponse, PowerLogDto, PowerSessionDto, TimerDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bms_auth::AuthError;
use bms_storage::{ChillerRecord, PowerLogRecord, StorageError, TimerRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use domain::PowerSession;
use tracing::error;

/// 指定状态码与错误码的错误响应
pub fn error_response(status: StatusCode, code: &str) -> Response {
    (status, Json(ErrorResponse::new(code))).into_response()
}

/// 禁止访问错误响应
pub fn forbidden_error() -> Response {
    error_response(StatusCode::FORBIDDEN, "forbidden")
}

/// 错误请求响应
pub fn bad_request_error(code: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, code)
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found")
}

/// 设备侧失败
pub fn device_error(code: &str) -> Response {
    error_response(StatusCode::BAD_GATEWAY, code)
}

/// 认证内部错误响应
pub fn internal_auth_error(err: AuthError) -> Response {
    error!(target: "bms.api", error = %err, "auth_internal_error");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
}

/// 存储错误响应
pub fn storage_error(err: StorageError) -> Response {
    error!(target: "bms.api", error = %err, "storage_error");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
}

pub fn format_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// ChillerRecord 转 ChillerDto
pub fn chiller_to_dto(record: ChillerRecord) -> ChillerDto {
    ChillerDto {
        id: record.id,
        name: record.name,
        ip: record.ip,
        active: record.active,
    }
}

/// TimerRecord 转 TimerDto
pub fn timer_to_dto(record: TimerRecord) -> TimerDto {
    TimerDto {
        id: record.id,
        chiller_name: record.chiller_name,
        chiller_ip: record.chiller_ip,
        mode: record.mode.as_str().to_string(),
        hours: record.hours,
        target_at: format_time(record.target_at),
        active: record.active,
    }
}

/// PowerLogRecord 转 PowerLogDto
pub fn power_log_to_dto(record: PowerLogRecord) -> PowerLogDto {
    PowerLogDto {
        id: record.id,
        unit_name: record.unit_name,
        action: record.action.as_str().to_string(),
        at: format_time(record.at),
        user: record.user,
    }
}

/// PowerSession 转 PowerSessionDto
pub fn power_session_to_dto(session: PowerSession) -> PowerSessionDto {
    PowerSessionDto {
        id: session.id,
        unit_name: session.unit_name,
        state: session.state.as_str().to_string(),
        start_at: format_time(session.start_at),
        end_at: session.end_at.map(format_time),
        duration_ms: session.duration_ms,
    }
}
