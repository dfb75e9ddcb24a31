//! 冷水机组管理 HTTP API。
//!
//! 路由同时挂载在 `/` 与 `/api` 下；每个请求注入 request_id/trace_id 并记录追踪 span。

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod utils;

use std::sync::Arc;

use axum::Router;
use bms_auth::AuthService;
use bms_config::{ChillerSeed, VarsConfig};
use bms_control::ChillerController;
use bms_scheduler::TimerScheduler;
use bms_storage::{ChillerStore, PowerLogStore};
use tower_http::trace::TraceLayer;

/// 处理函数共享的应用状态。
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub chillers: Arc<dyn ChillerStore>,
    pub power_logs: Arc<dyn PowerLogStore>,
    pub scheduler: Arc<TimerScheduler>,
    pub controller: Arc<dyn ChillerController>,
    pub vars: Arc<VarsConfig>,
    /// 机组清单为空时用于初始化的配置项
    pub chiller_seeds: Arc<Vec<ChillerSeed>>,
}

/// 组装完整的应用路由。
pub fn create_app(state: AppState) -> Router {
    let api = routes::create_api_router();
    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::request_context))
}
