//! 输入验证辅助函数
//!
//! - normalize_required：去除首尾空格并检查非空
//! - json_truthy：按前端约定判断 JSON 取值的真假
//! - parse_target_at：解析定时任务的目标时间
//! - setpoint_value：从控制请求中取设定温度

use api_contract::ChillerControlRequest;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// 去除首尾空格，空串返回 None
pub fn normalize_required(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// `null`、`false`、`0`、`NaN`、空串为假，其余为真
pub fn json_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// RFC 3339；不带时区的 `YYYY-MM-DDTHH:MM[:SS]` 按 UTC 解释
pub fn parse_target_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// 设定温度取值：`value` 可为数字或数字串（空串视为 0），
/// 缺失时依次回退到数字形式的 `temp`、`setpoint`。
pub fn setpoint_value(req: &ChillerControlRequest) -> Option<f64> {
    let parsed = match req.value.as_ref() {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Some(0.0)
            } else {
                text.parse::<f64>().ok()
            }
        }
        _ => req
            .temp
            .as_ref()
            .and_then(Value::as_f64)
            .or_else(|| req.setpoint.as_ref().and_then(Value::as_f64)),
    };
    parsed.filter(|value| value.is_finite())
}
