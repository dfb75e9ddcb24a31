//! 认证和授权中间件
//!
//! 提供以下中间件和辅助函数：
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - bearer_token / cookie_token：从 Authorization 头或 `session` cookie 提取会话令牌
//! - require_session：验证令牌并提取会话上下文
//! - require_control / require_admin：在会话之上叠加角色判定
//!
//! 缺失、过期或无效的令牌与角色不足一样返回 403 `forbidden`，
//! 判定发生在任何存储或设备访问之前。

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use bms_auth::AuthError;
use bms_telemetry::new_request_ids;
use domain::SessionContext;
use tracing::{Instrument, info_span};

use crate::AppState;
use crate::utils::response::{forbidden_error, internal_auth_error};

/// 会话 cookie 名称
pub const SESSION_COOKIE: &str = "session";

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response: Response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// 从请求头中提取 Bearer token
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header_value = headers.get(header::AUTHORIZATION)?;
    let auth_str = header_value.to_str().ok()?;
    auth_str.strip_prefix("Bearer ")
}

/// 从 Cookie 头中提取 `session` 的值
pub fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// 验证并提取会话上下文（Bearer 优先，其次 cookie）
pub fn require_session(state: &AppState, headers: &HeaderMap) -> Result<SessionContext, Response> {
    let token = match bearer_token(headers).or_else(|| cookie_token(headers)) {
        Some(token) => token,
        None => return Err(forbidden_error()),
    };
    match state.auth.verify_session(token) {
        Ok(ctx) => Ok(ctx),
        Err(AuthError::TokenInvalid | AuthError::TokenExpired) => Err(forbidden_error()),
        Err(err) => Err(internal_auth_error(err)),
    }
}

/// 需要控制权限（admin / manager）
pub fn require_control(state: &AppState, headers: &HeaderMap) -> Result<SessionContext, Response> {
    let ctx = require_session(state, headers)?;
    if !ctx.can_control() {
        return Err(forbidden_error());
    }
    Ok(ctx)
}

/// 需要管理员权限
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<SessionContext, Response> {
    let ctx = require_session(state, headers)?;
    if !ctx.can_manage_chillers() {
        return Err(forbidden_error());
    }
    Ok(ctx)
}
