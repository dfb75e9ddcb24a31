use serde::{Deserialize, Serialize};

/// 开关机动作。
///
/// 序列化为 `"on"` / `"off"`；反序列化时除 `"on"` 外一律视为 `Off`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PowerAction {
    On,
    Off,
}

impl PowerAction {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("on") {
            PowerAction::On
        } else {
            PowerAction::Off
        }
    }

    pub fn from_target(target: bool) -> Self {
        if target { PowerAction::On } else { PowerAction::Off }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, PowerAction::On)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerAction::On => "on",
            PowerAction::Off => "off",
        }
    }
}

impl From<String> for PowerAction {
    fn from(value: String) -> Self {
        PowerAction::parse(&value)
    }
}

impl From<PowerAction> for String {
    fn from(value: PowerAction) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 机组运行模式（控制器 `SetTyp` 变量的取值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChillerMode {
    Off,
    PreComfort,
    Economy,
    Comfort,
}

impl ChillerMode {
    /// 控制器上的数值编码。
    pub fn code(&self) -> u8 {
        match self {
            ChillerMode::Off => 0,
            ChillerMode::PreComfort => 1,
            ChillerMode::Economy => 2,
            ChillerMode::Comfort => 3,
        }
    }

    /// 状态展示用名称。
    pub fn label(&self) -> &'static str {
        match self {
            ChillerMode::Off => "off",
            ChillerMode::PreComfort => "precomfort",
            ChillerMode::Economy => "economy",
            ChillerMode::Comfort => "comfort",
        }
    }

    /// 由读回的数值还原模式；非 0..=3 的整数返回 `None`。
    pub fn from_code(value: f64) -> Option<Self> {
        if value == 0.0 {
            Some(ChillerMode::Off)
        } else if value == 1.0 {
            Some(ChillerMode::PreComfort)
        } else if value == 2.0 {
            Some(ChillerMode::Economy)
        } else if value == 3.0 {
            Some(ChillerMode::Comfort)
        } else {
            None
        }
    }

    /// 解析命令中的模式名；未知名称按 `Off` 处理。
    pub fn from_command(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pre" | "precomfort" => ChillerMode::PreComfort,
            "eco" | "economy" => ChillerMode::Economy,
            "comfort" => ChillerMode::Comfort,
            _ => ChillerMode::Off,
        }
    }
}
