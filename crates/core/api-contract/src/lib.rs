//! 稳定的 DTO 与 API 响应契约。
//!
//! 所有字段以 camelCase 序列化，与前端面板的调用约定一致。

use serde::{Deserialize, Serialize};

/// 成功但无数据的响应：`{"ok":true}`。
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { ok: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// 失败响应：`{"ok":false,"error":"<code>"}`。
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: code.into(),
        }
    }
}

/// 登录请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub ok: bool,
    pub role: String,
    pub token: String,
    pub expires_at: i64,
}

/// 可达性探测响应。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachabilityResponse {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 可达性探测查询参数。
#[derive(Debug, Default, Deserialize)]
pub struct ReachabilityQuery {
    #[serde(default)]
    pub ip: Option<String>,
}

/// 机组控制请求体。
///
/// 字段按 `kind` 取用：`power` 用 `target`，`mode` 用 `mode`，
/// `setpoint` 用 `value`（兼容 `temp` / `setpoint`）。
/// 取值保持为原始 JSON，由处理函数按各自规则解释。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChillerControlRequest {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub target: Option<serde_json::Value>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub temp: Option<serde_json::Value>,
    #[serde(default)]
    pub setpoint: Option<serde_json::Value>,
}

/// 设定温度命令的响应。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetpointResponse {
    pub ok: bool,
    pub actual: Option<f64>,
}

/// 机组状态快照。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChillerStatusResponse {
    pub ok: bool,
    pub power: bool,
    pub temp_current: Option<f64>,
    pub temp_return: Option<f64>,
    pub setpoint: Option<f64>,
    pub fan_speed: f64,
    pub alarm_active: bool,
    pub mode: Option<String>,
}

/// 定时任务。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerDto {
    pub id: String,
    pub chiller_name: String,
    pub chiller_ip: String,
    pub mode: String,
    pub hours: f64,
    pub target_at: String,
    pub active: bool,
}

/// 定时任务查询参数（`chillerIp`，兼容 `ip`）。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerQuery {
    #[serde(default)]
    pub chiller_ip: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

impl TimerQuery {
    pub fn resolved_ip(&self) -> Option<&str> {
        self.chiller_ip
            .as_deref()
            .or(self.ip.as_deref())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    }
}

/// 创建定时任务请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimerRequest {
    pub chiller_name: String,
    pub chiller_ip: String,
    pub mode: String,
    pub hours: f64,
    pub target_at: String,
}

#[derive(Debug, Serialize)]
pub struct TimerItemResponse {
    pub item: Option<TimerDto>,
}

#[derive(Debug, Serialize)]
pub struct CreatedTimerResponse {
    pub ok: bool,
    pub item: TimerDto,
}

/// 机组。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChillerDto {
    pub id: String,
    pub name: String,
    pub ip: String,
    pub active: bool,
}

/// 新增机组请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChillerRequest {
    pub name: String,
    pub ip: String,
    pub active: bool,
}

/// 修改机组请求体（部分字段）。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChillerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ChillerListResponse {
    pub items: Vec<ChillerDto>,
}

#[derive(Debug, Serialize)]
pub struct ChillerItemResponse {
    pub ok: bool,
    pub item: ChillerDto,
}

/// 开关机日志。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerLogDto {
    pub id: String,
    pub unit_name: String,
    pub action: String,
    pub at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// 追加开关机日志请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePowerLogRequest {
    pub unit_name: String,
    pub action: String,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PowerLogListResponse {
    pub items: Vec<PowerLogDto>,
}

/// 由日志还原出的开关机时段。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerSessionDto {
    pub id: String,
    pub unit_name: String,
    pub state: String,
    pub start_at: String,
    pub end_at: Option<String>,
    pub duration_ms: i64,
}

#[derive(Debug, Serialize)]
pub struct PowerSessionListResponse {
    pub items: Vec<PowerSessionDto>,
}

/// 指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub device_fetches: u64,
    pub device_fetch_failures: u64,
    pub cache_hits: u64,
    pub cache_joins: u64,
    pub device_writes: u64,
    pub device_write_failures: u64,
    pub setpoint_verify_failures: u64,
    pub setpoint_unlock_attempts: u64,
    pub timers_fired: u64,
    pub timer_command_failures: u64,
}
