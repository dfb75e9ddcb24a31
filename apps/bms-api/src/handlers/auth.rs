//! 认证相关 handlers：健康检查、登录、登出
//!
//! - `GET /health` - 返回 `{"ok": true}`
//! - `POST /auth/login` - 校验用户名口令，签发会话令牌并写入 `session` cookie
//! - `POST /auth/logout` - 清除 `session` cookie
//!
//! 令牌同时出现在响应体中，非浏览器客户端可改用 `Authorization: Bearer`。

use crate::AppState;
use crate::middleware::SESSION_COOKIE;
use crate::utils::response::{bad_request_error, error_response, internal_auth_error};
use api_contract::{LoginRequest, LoginResponse, OkResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bms_auth::AuthError;
use tracing::{info, warn};

/// 健康检查端点，无需认证。
pub async fn health() -> impl IntoResponse {
    Json(OkResponse::new())
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = body else {
        return bad_request_error("bad_request");
    };
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return bad_request_error("bad_request");
    }

    match state.auth.login(username, &req.password).await {
        Ok((user, session)) => {
            info!(target: "bms.api", username = %user.username, role = %user.role, "login_succeeded");
            let cookie = format!(
                "{SESSION_COOKIE}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
                session.token, session.ttl_seconds
            );
            let body = LoginResponse {
                ok: true,
                role: user.role.as_str().to_string(),
                token: session.token,
                expires_at: session.expires_at_ms,
            };
            with_cookie((StatusCode::OK, Json(body)).into_response(), &cookie)
        }
        Err(AuthError::InvalidCredentials) => {
            warn!(target: "bms.api", username, "login_rejected");
            error_response(StatusCode::UNAUTHORIZED, "invalid_credentials")
        }
        Err(err) => internal_auth_error(err),
    }
}

pub async fn logout() -> Response {
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    with_cookie(Json(OkResponse::new()).into_response(), &cookie)
}

fn with_cookie(mut response: Response, cookie: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}
