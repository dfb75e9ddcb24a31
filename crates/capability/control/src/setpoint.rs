//! 设定温度写入策略。
//!
//! ```text
//! Dot ──读回不符──▶ Comma ──读回不符──▶ Unlock(var, code) ──▶ Dot ──▶ Comma ──▶ 下一组解锁 …
//!  │                 │                                        │        │
//!  └──────读回相符───┴──────────────────▶ Done ◀──────────────┴────────┘
//! ```

use std::fmt;
use std::time::Duration;

/// 舒适模式设定温度的厂商变量名；设定变量名匹配 `CurrRoomTempSetP` 时先写它。
pub const COMFORT_SETPOINT_ALIAS: &str = "UnitSetP.RoomTempSetP.Comfort";

/// 设定温度写入参数。
#[derive(Debug, Clone)]
pub struct SetpointPolicy {
    pub min: f64,
    pub max: f64,
    /// 读回值与期望值的允许偏差
    pub tolerance: f64,
    /// 写入后等待控制器处理的时间
    pub settle_delay: Duration,
    /// 写入解锁码后的等待时间
    pub unlock_delay: Duration,
    pub unlock_vars: Vec<String>,
    pub unlock_codes: Vec<String>,
}

impl Default for SetpointPolicy {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 50.0,
            tolerance: 0.15,
            settle_delay: Duration::from_millis(700),
            unlock_delay: Duration::from_millis(600),
            unlock_vars: vec![
                "PwdUser".to_string(),
                "PwdService".to_string(),
                "PwdManuf".to_string(),
            ],
            unlock_codes: vec!["1489".to_string(), "1234".to_string()],
        }
    }
}

impl SetpointPolicy {
    /// 读回值是否可以接受。浮点误差不应让恰好等于容差的读回被拒绝。
    pub fn accepts(&self, actual: f64, desired: f64) -> bool {
        (actual - desired).abs() <= self.tolerance + 1e-9
    }

    /// 所有解锁组合，按变量优先、解锁码其次的顺序。
    pub fn unlock_sequence(&self) -> impl Iterator<Item = (&str, &str)> {
        self.unlock_vars.iter().flat_map(move |var| {
            self.unlock_codes
                .iter()
                .map(move |code| (var.as_str(), code.as_str()))
        })
    }
}

/// 写入阶段，用于日志。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointStage {
    Dot,
    Comma,
    Unlock,
}

impl SetpointStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetpointStage::Dot => "dot",
            SetpointStage::Comma => "comma",
            SetpointStage::Unlock => "unlock",
        }
    }
}

impl fmt::Display for SetpointStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 设定温度写入结果；`actual` 为最后一次读回的数值。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetpointOutcome {
    pub ok: bool,
    pub actual: Option<f64>,
}

/// 两种小数格式：`21.5` 与 `21,5`。
pub(crate) fn decimal_formats(value: f64) -> [String; 2] {
    let dot = format!("{value:.1}");
    let comma = dot.replacen('.', ",", 1);
    [dot, comma]
}

/// 写入目标：设定变量名包含 `CurrRoomTempSetP`（不区分大小写）时，舒适模式别名排在最前。
pub(crate) fn setpoint_targets(var_name: &str) -> Vec<String> {
    let mut targets = Vec::with_capacity(2);
    if var_name.to_ascii_lowercase().contains("currroomtempsetp") {
        targets.push(COMFORT_SETPOINT_ALIAS.to_string());
    }
    targets.push(var_name.to_string());
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats() {
        assert_eq!(decimal_formats(21.5), ["21.5".to_string(), "21,5".to_string()]);
        assert_eq!(decimal_formats(50.0), ["50.0".to_string(), "50,0".to_string()]);
    }

    #[test]
    fn comfort_alias_only_for_room_setpoint() {
        assert_eq!(
            setpoint_targets("CurrRoomTempSetP_Val"),
            vec![COMFORT_SETPOINT_ALIAS.to_string(), "CurrRoomTempSetP_Val".to_string()]
        );
        assert_eq!(
            setpoint_targets("currroomtempsetp"),
            vec![COMFORT_SETPOINT_ALIAS.to_string(), "currroomtempsetp".to_string()]
        );
        assert_eq!(setpoint_targets("WaterSetP"), vec!["WaterSetP".to_string()]);
    }

    #[test]
    fn unlock_sequence_order() {
        let policy = SetpointPolicy::default();
        let seq: Vec<(&str, &str)> = policy.unlock_sequence().collect();
        assert_eq!(seq.len(), 6);
        assert_eq!(seq[0], ("PwdUser", "1489"));
        assert_eq!(seq[1], ("PwdUser", "1234"));
        assert_eq!(seq[5], ("PwdManuf", "1234"));
    }

    #[test]
    fn tolerance_boundary() {
        let policy = SetpointPolicy::default();
        assert!(policy.accepts(21.6, 21.5));
        assert!(policy.accepts(21.65, 21.5));
        assert!(!policy.accepts(21.7, 21.5));
    }
}
