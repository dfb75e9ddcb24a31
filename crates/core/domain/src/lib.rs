pub mod data;
pub mod permissions;
pub mod sessions;

pub use data::{ChillerMode, PowerAction};
pub use permissions::Role;
pub use sessions::{PowerSession, PowerTransition, derive_power_sessions};

/// 会话上下文：通过认证的调用方身份。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub username: String,
    pub role: Role,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// 是否允许下发开关机、模式、设定温度等命令。
    pub fn can_control(&self) -> bool {
        self.role.can_control()
    }

    /// 是否允许维护机组清单。
    pub fn can_manage_chillers(&self) -> bool {
        self.role.can_manage_chillers()
    }
}
