//! dashboard 配置文件：变量映射与初始机组清单。
//!
//! ```json
//! {
//!   "units": [{ "vars": { "PowerCmd": "SystemStatus.Ctrl", "ModeCmd": "SetTyp" } }],
//!   "chillers": [{ "id": "c1", "name": "CH-1", "ip": "10.0.0.5", "active": true }]
//! }
//! ```
//!
//! 文件缺失、JSON 损坏、字段缺失或类型不符时均回退默认值，加载永不失败。

use std::path::Path;

use serde_json::Value;
use tracing::warn;

/// 名称为空时使用的机组名。
pub const DEFAULT_CHILLER_NAME: &str = "بدون نام";

/// 逻辑变量到控制器厂商变量名的映射。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarsConfig {
    pub power_cmd: String,
    pub mode_cmd: String,
    pub temp_current: String,
    pub temp_return: String,
    pub temp_setpoint: String,
    pub power_fb: String,
    pub fan_speed_fb: String,
    pub alarm_active: String,
    pub mode_fb: String,
}

impl Default for VarsConfig {
    fn default() -> Self {
        Self {
            power_cmd: "SystemStatus.Ctrl".to_string(),
            mode_cmd: "SetTyp".to_string(),
            temp_current: "ReturnTemp.ReadVal".to_string(),
            temp_return: "ReturnTemp.ReadVal".to_string(),
            temp_setpoint: "CurrRoomTempSetP_Val".to_string(),
            power_fb: "SystemStatus.Ctrl".to_string(),
            fan_speed_fb: "MB_Devices.FanElectricalInfo_ZA_1.Modulation".to_string(),
            alarm_active: "Al03_PWRP_1.Active".to_string(),
            mode_fb: "SetTyp".to_string(),
        }
    }
}

impl VarsConfig {
    /// 逐字段读取；非字符串或空串的字段保留默认值。
    pub fn from_json(value: &Value) -> Self {
        let mut vars = Self::default();
        let fields: [(&str, &mut String); 9] = [
            ("PowerCmd", &mut vars.power_cmd),
            ("ModeCmd", &mut vars.mode_cmd),
            ("TempCurrent", &mut vars.temp_current),
            ("TempReturn", &mut vars.temp_return),
            ("TempSetpoint", &mut vars.temp_setpoint),
            ("PowerFb", &mut vars.power_fb),
            ("FanSpeedFb", &mut vars.fan_speed_fb),
            ("AlarmActive", &mut vars.alarm_active),
            ("ModeFb", &mut vars.mode_fb),
        ];
        for (key, slot) in fields {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                let text = text.trim();
                if !text.is_empty() {
                    *slot = text.to_string();
                }
            }
        }
        vars
    }
}

/// 配置文件中的机组种子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChillerSeed {
    pub id: Option<String>,
    pub name: String,
    pub ip: String,
    pub active: bool,
}

impl ChillerSeed {
    fn from_json(value: &Value) -> Self {
        let id = value
            .get("id")
            .and_then(scalar_to_string)
            .filter(|id| !id.trim().is_empty());
        let name = value
            .get("name")
            .and_then(scalar_to_string)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_CHILLER_NAME.to_string());
        let ip = value.get("ip").and_then(scalar_to_string).unwrap_or_default();
        let active = value.get("active").map(json_truthy).unwrap_or(false);
        Self {
            id,
            name,
            ip,
            active,
        }
    }
}

/// dashboard 配置。
#[derive(Debug, Clone, Default)]
pub struct DashboardConfig {
    pub vars: VarsConfig,
    pub chillers: Vec<ChillerSeed>,
}

impl DashboardConfig {
    /// 读取配置文件，任何失败都回退默认值。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(target: "bms.config", path = %path.display(), error = %err, "dashboard_config_unreadable");
                return Self::default();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Self::from_json(&value),
            Err(err) => {
                warn!(target: "bms.config", path = %path.display(), error = %err, "dashboard_config_invalid");
                Self::default()
            }
        }
    }

    pub fn from_json(value: &Value) -> Self {
        let vars = value
            .get("units")
            .and_then(Value::as_array)
            .and_then(|units| units.first())
            .and_then(|unit| unit.get("vars"))
            .map(VarsConfig::from_json)
            .unwrap_or_default();
        let chillers = value
            .get("chillers")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(ChillerSeed::from_json).collect())
            .unwrap_or_default();
        Self { vars, chillers }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
