//! # 机组控制能力模块
//!
//! 在变量表客户端之上提供四个逻辑操作：状态读取、开关机、模式切换、设定温度。
//! HTTP 接口与定时任务都只依赖 [`ChillerController`]，不直接接触设备协议。
//!
//! 设备侧的失败（不可达、非 2xx、读回不符）都以 `false` / `ok = false` 返回，不向上抛错。

mod adapter;
pub mod coerce;
mod setpoint;

use async_trait::async_trait;
use bms_config::VarsConfig;

pub use adapter::ChillerAdapter;
pub use setpoint::{COMFORT_SETPOINT_ALIAS, SetpointOutcome, SetpointPolicy, SetpointStage};

/// 一次状态读取的结果。`ok = false` 表示变量表没有取到（设备不可达）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusResult {
    pub ok: bool,
    pub power: bool,
    pub temp_current: Option<f64>,
    pub temp_return: Option<f64>,
    pub setpoint: Option<f64>,
    pub fan_speed: f64,
    pub alarm_active: bool,
    pub mode: Option<String>,
}

impl StatusResult {
    pub fn unreachable() -> Self {
        Self::default()
    }
}

/// 机组控制接口。
#[async_trait]
pub trait ChillerController: Send + Sync {
    /// 设备是否可达（经缓存）。
    async fn probe(&self, ip: &str) -> bool;

    async fn read_status(&self, ip: &str, vars: &VarsConfig) -> StatusResult;

    /// 只有电源命令本身写入成功才返回 `true`。
    async fn set_power(&self, ip: &str, vars: &VarsConfig, on: bool) -> bool;

    async fn set_mode(&self, ip: &str, vars: &VarsConfig, mode: &str) -> bool;

    async fn apply_setpoint(&self, ip: &str, vars: &VarsConfig, desired: f64) -> SetpointOutcome;
}
