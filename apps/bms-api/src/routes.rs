//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers：
//! - 健康检查：/health
//! - 认证：/auth/login, /auth/logout
//! - 设备：/chiller-status, /chiller-control
//! - 定时任务：/timers
//! - 机组清单：/chillers/*
//! - 开关机日志：/power-log, /power-log/sessions
//! - 指标：/metrics

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// 创建 API 路由
///
/// 返回包含所有 API 端点的 Router，由 `create_app` 同时挂载到 / 与 /api 下
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/chiller-status", get(chiller_status))
        .route("/chiller-control", post(chiller_control))
        .route(
            "/timers",
            get(get_timer).post(create_timer).delete(delete_timers),
        )
        .route("/chillers", get(list_chillers).post(create_chiller))
        .route(
            "/chillers/:id",
            get(get_chiller).put(update_chiller).delete(delete_chiller),
        )
        .route("/power-log", get(list_power_logs).post(append_power_log))
        .route("/power-log/sessions", get(list_power_sessions))
        .route("/metrics", get(get_metrics))
}
