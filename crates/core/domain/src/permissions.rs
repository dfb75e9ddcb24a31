//! 角色与权限判定。

use serde::{Deserialize, Serialize};

/// 用户角色。
///
/// - `Admin`：机组与定时任务的完整维护权限，以及全部控制命令
/// - `Manager`：开关机、模式、设定温度、状态命令，定时任务与开关机日志
/// - `Viewer`：只读
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Manager,
    Viewer,
}

impl Role {
    /// 宽松解析：未知角色一律视为 `Viewer`。
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            _ => Role::Viewer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Viewer => "viewer",
        }
    }

    pub fn can_control(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn can_manage_chillers(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_view_metrics(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
