//! 存储接口 Trait 定义
//!
//! - ChillerStore：机组清单
//! - TimerStore：定时任务
//! - PowerLogStore：开关机日志
//! - UserStore：用户
//!
//! 所有接口返回 StorageError，使用 async_trait 支持动态分发。

use crate::error::StorageError;
use crate::models::{
    ChillerRecord, ChillerUpdate, NewChiller, NewPowerLog, NewTimer, PowerLogRecord, TimerRecord,
    UserRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 机组存储接口
#[async_trait]
pub trait ChillerStore: Send + Sync {
    /// 列出机组；`include_inactive = false` 时仅返回启用的机组
    async fn list_chillers(&self, include_inactive: bool)
    -> Result<Vec<ChillerRecord>, StorageError>;

    /// 按 id 查找（包括已停用的机组）
    async fn find_chiller(&self, id: &str) -> Result<Option<ChillerRecord>, StorageError>;

    /// 创建机组，id 由存储生成
    async fn create_chiller(&self, new: NewChiller) -> Result<ChillerRecord, StorageError>;

    /// 按 id 插入或覆盖
    async fn upsert_chiller(&self, record: ChillerRecord) -> Result<ChillerRecord, StorageError>;

    /// 部分更新，不存在时返回 None
    async fn update_chiller(
        &self,
        id: &str,
        update: ChillerUpdate,
    ) -> Result<Option<ChillerRecord>, StorageError>;

    /// 软删除，不存在时返回 None
    async fn deactivate_chiller(&self, id: &str) -> Result<Option<ChillerRecord>, StorageError>;
}

/// 定时任务存储接口
#[async_trait]
pub trait TimerStore: Send + Sync {
    /// 创建一个 active 定时任务
    async fn create_timer(&self, new: NewTimer) -> Result<TimerRecord, StorageError>;

    /// 指定 IP 最近创建的 active 定时任务
    async fn find_active_timer(&self, chiller_ip: &str)
    -> Result<Option<TimerRecord>, StorageError>;

    /// 停用指定 IP 的全部 active 定时任务，返回停用数量
    async fn deactivate_timers_for_ip(&self, chiller_ip: &str) -> Result<usize, StorageError>;

    /// active 且 `target_at <= now` 的定时任务
    async fn list_due_timers(&self, now: DateTime<Utc>) -> Result<Vec<TimerRecord>, StorageError>;

    /// active → inactive 的条件转换；已停用或不存在时返回 false
    async fn claim_timer(&self, timer_id: &str) -> Result<bool, StorageError>;
}

/// 开关机日志存储接口
#[async_trait]
pub trait PowerLogStore: Send + Sync {
    /// 追加日志（最新在前），同时执行保留策略
    async fn append_power_log(&self, new: NewPowerLog) -> Result<PowerLogRecord, StorageError>;

    /// 保留期内的日志，最新在前，最多 `limit` 条
    async fn list_power_logs(&self, limit: usize) -> Result<Vec<PowerLogRecord>, StorageError>;
}

/// 用户存储接口
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 按用户名插入或覆盖
    async fn upsert_user(&self, record: UserRecord) -> Result<(), StorageError>;

    /// 替换口令哈希，用户不存在时返回 false
    async fn update_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError>;
}
