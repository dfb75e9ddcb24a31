//! 内存存储实现
//!
//! 仅用于测试和演示，进程重启后数据丢失。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::RwLock;

use crate::dataset::Dataset;
use crate::error::StorageError;
use crate::models::{
    ChillerRecord, ChillerUpdate, NewChiller, NewPowerLog, NewTimer, PowerLogPolicy,
    PowerLogRecord, TimerRecord, UserRecord,
};
use crate::traits::{ChillerStore, PowerLogStore, TimerStore, UserStore};

/// 内存存储
///
/// 使用 RwLock 保护一个数据集，同时实现全部存储接口。
pub struct InMemoryStore {
    data: RwLock<Dataset>,
    power_log_policy: PowerLogPolicy,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_dataset(Dataset::default())
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            data: RwLock::new(dataset),
            power_log_policy: PowerLogPolicy::default(),
        }
    }

    pub fn with_power_log_policy(mut self, policy: PowerLogPolicy) -> Self {
        self.power_log_policy = policy;
        self
    }

    fn read<T>(&self, f: impl FnOnce(&Dataset) -> T) -> Result<T, StorageError> {
        let data = self
            .data
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(f(&data))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Dataset) -> T) -> Result<T, StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(f(&mut data))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChillerStore for InMemoryStore {
    async fn list_chillers(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<ChillerRecord>, StorageError> {
        self.read(|data| data.list_chillers(include_inactive))
    }

    async fn find_chiller(&self, id: &str) -> Result<Option<ChillerRecord>, StorageError> {
        self.read(|data| data.find_chiller(id))
    }

    async fn create_chiller(&self, new: NewChiller) -> Result<ChillerRecord, StorageError> {
        self.write(|data| data.create_chiller(new, Utc::now()))
    }

    async fn upsert_chiller(&self, record: ChillerRecord) -> Result<ChillerRecord, StorageError> {
        self.write(|data| data.upsert_chiller(record, Utc::now()))
    }

    async fn update_chiller(
        &self,
        id: &str,
        update: ChillerUpdate,
    ) -> Result<Option<ChillerRecord>, StorageError> {
        self.write(|data| data.update_chiller(id, update, Utc::now()))
    }

    async fn deactivate_chiller(&self, id: &str) -> Result<Option<ChillerRecord>, StorageError> {
        self.write(|data| data.deactivate_chiller(id, Utc::now()))
    }
}

#[async_trait]
impl TimerStore for InMemoryStore {
    async fn create_timer(&self, new: NewTimer) -> Result<TimerRecord, StorageError> {
        self.write(|data| data.create_timer(new, Utc::now()))
    }

    async fn find_active_timer(
        &self,
        chiller_ip: &str,
    ) -> Result<Option<TimerRecord>, StorageError> {
        self.read(|data| data.find_active_timer(chiller_ip))
    }

    async fn deactivate_timers_for_ip(&self, chiller_ip: &str) -> Result<usize, StorageError> {
        self.write(|data| data.deactivate_timers_for_ip(chiller_ip, Utc::now()))
    }

    async fn list_due_timers(&self, now: DateTime<Utc>) -> Result<Vec<TimerRecord>, StorageError> {
        self.read(|data| data.list_due_timers(now))
    }

    async fn claim_timer(&self, timer_id: &str) -> Result<bool, StorageError> {
        self.write(|data| data.claim_timer(timer_id, Utc::now()))
    }
}

#[async_trait]
impl PowerLogStore for InMemoryStore {
    async fn append_power_log(&self, new: NewPowerLog) -> Result<PowerLogRecord, StorageError> {
        let policy = self.power_log_policy;
        self.write(|data| data.append_power_log(new, policy, Utc::now()))
    }

    async fn list_power_logs(&self, limit: usize) -> Result<Vec<PowerLogRecord>, StorageError> {
        let policy = self.power_log_policy;
        self.read(|data| data.list_power_logs(limit, policy, Utc::now()))
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        self.read(|data| data.find_user(username))
    }

    async fn upsert_user(&self, record: UserRecord) -> Result<(), StorageError> {
        self.write(|data| data.upsert_user(record))
    }

    async fn update_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError> {
        self.write(|data| data.update_password_hash(username, password_hash))
    }
}
