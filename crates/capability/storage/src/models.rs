//! 存储数据模型
//!
//! 字段以 camelCase 序列化，与既有的 `data/db.json` 文件格式兼容。

use chrono::{DateTime, Duration, Utc};
use domain::{PowerAction, Role};
use serde::{Deserialize, Serialize};

/// 机组记录。删除为软删除（`active = false`），记录始终可按 id 查询。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChillerRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 新建机组的输入。
#[derive(Debug, Clone)]
pub struct NewChiller {
    pub name: String,
    pub ip: String,
    pub active: bool,
}

/// 机组部分更新。
#[derive(Debug, Clone, Default)]
pub struct ChillerUpdate {
    pub name: Option<String>,
    pub ip: Option<String>,
    pub active: Option<bool>,
}

/// 定时任务记录。只会被置为 inactive，不会物理删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub id: String,
    pub chiller_name: String,
    pub chiller_ip: String,
    pub mode: PowerAction,
    pub hours: f64,
    pub target_at: DateTime<Utc>,
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// 新建定时任务的输入。
#[derive(Debug, Clone)]
pub struct NewTimer {
    pub chiller_name: String,
    pub chiller_ip: String,
    pub mode: PowerAction,
    pub hours: f64,
    pub target_at: DateTime<Utc>,
}

/// 开关机日志记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerLogRecord {
    pub id: String,
    pub unit_name: String,
    pub action: PowerAction,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// 追加开关机日志的输入。
#[derive(Debug, Clone)]
pub struct NewPowerLog {
    pub unit_name: String,
    pub action: PowerAction,
    pub at: DateTime<Utc>,
    pub user: Option<String>,
}

/// 开关机日志的保留策略。
#[derive(Debug, Clone, Copy)]
pub struct PowerLogPolicy {
    pub retention: Duration,
    pub max_entries: usize,
}

impl Default for PowerLogPolicy {
    fn default() -> Self {
        Self {
            retention: Duration::days(30),
            max_entries: 1000,
        }
    }
}

/// 用户记录。
///
/// `password_hash` 为 argon2 PHC 串；旧数据文件中可能是 SHA-256 十六进制串，
/// 登录成功后由认证层升级。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}
