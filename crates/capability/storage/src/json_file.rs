//! JSON 文件存储实现
//!
//! 整个数据集保存在一个 JSON 文件中（`{powerLogs, users, chillers, timers}`）。
//!
//! 写入流程：
//! 1. 持有异步互斥锁，复制当前数据集并在副本上修改
//! 2. 序列化到 `<file>.tmp`
//! 3. `rename` 覆盖正式文件
//! 4. 落盘成功后才替换内存中的数据集
//!
//! 任一步失败时内存与文件都保持修改前的状态。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::error::StorageError;
use crate::models::{
    ChillerRecord, ChillerUpdate, NewChiller, NewPowerLog, NewTimer, PowerLogPolicy,
    PowerLogRecord, TimerRecord, UserRecord,
};
use crate::traits::{ChillerStore, PowerLogStore, TimerStore, UserStore};

pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<Dataset>,
    power_log_policy: PowerLogPolicy,
}

impl JsonFileStore {
    /// 打开数据文件；文件不存在时创建空数据集，内容损坏时记录告警并从空数据集开始。
    pub async fn open(
        path: impl Into<PathBuf>,
        power_log_policy: PowerLogPolicy,
    ) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let dataset = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Dataset>(&bytes) {
                Ok(dataset) => dataset,
                Err(err) => {
                    warn!(target: "bms.storage", path = %path.display(), error = %err, "data_file_corrupt");
                    Dataset::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let dataset = Dataset::default();
                persist(&path, &dataset).await?;
                info!(target: "bms.storage", path = %path.display(), "data_file_created");
                dataset
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            data: Mutex::new(dataset),
            power_log_policy,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read<T>(&self, f: impl FnOnce(&Dataset) -> T) -> T {
        let data = self.data.lock().await;
        f(&data)
    }

    async fn mutate<T>(&self, f: impl FnOnce(&mut Dataset) -> T) -> Result<T, StorageError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let output = f(&mut next);
        if next != *data {
            persist(&self.path, &next).await?;
            *data = next;
        }
        Ok(output)
    }
}

async fn persist(path: &Path, dataset: &Dataset) -> Result<(), StorageError> {
    let body = serde_json::to_vec_pretty(dataset)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&body).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl ChillerStore for JsonFileStore {
    async fn list_chillers(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<ChillerRecord>, StorageError> {
        Ok(self.read(|data| data.list_chillers(include_inactive)).await)
    }

    async fn find_chiller(&self, id: &str) -> Result<Option<ChillerRecord>, StorageError> {
        Ok(self.read(|data| data.find_chiller(id)).await)
    }

    async fn create_chiller(&self, new: NewChiller) -> Result<ChillerRecord, StorageError> {
        self.mutate(|data| data.create_chiller(new, Utc::now())).await
    }

    async fn upsert_chiller(&self, record: ChillerRecord) -> Result<ChillerRecord, StorageError> {
        self.mutate(|data| data.upsert_chiller(record, Utc::now()))
            .await
    }

    async fn update_chiller(
        &self,
        id: &str,
        update: ChillerUpdate,
    ) -> Result<Option<ChillerRecord>, StorageError> {
        self.mutate(|data| data.update_chiller(id, update, Utc::now()))
            .await
    }

    async fn deactivate_chiller(&self, id: &str) -> Result<Option<ChillerRecord>, StorageError> {
        self.mutate(|data| data.deactivate_chiller(id, Utc::now()))
            .await
    }
}

#[async_trait]
impl TimerStore for JsonFileStore {
    async fn create_timer(&self, new: NewTimer) -> Result<TimerRecord, StorageError> {
        self.mutate(|data| data.create_timer(new, Utc::now())).await
    }

    async fn find_active_timer(
        &self,
        chiller_ip: &str,
    ) -> Result<Option<TimerRecord>, StorageError> {
        Ok(self.read(|data| data.find_active_timer(chiller_ip)).await)
    }

    async fn deactivate_timers_for_ip(&self, chiller_ip: &str) -> Result<usize, StorageError> {
        self.mutate(|data| data.deactivate_timers_for_ip(chiller_ip, Utc::now()))
            .await
    }

    async fn list_due_timers(&self, now: DateTime<Utc>) -> Result<Vec<TimerRecord>, StorageError> {
        Ok(self.read(|data| data.list_due_timers(now)).await)
    }

    async fn claim_timer(&self, timer_id: &str) -> Result<bool, StorageError> {
        self.mutate(|data| data.claim_timer(timer_id, Utc::now()))
            .await
    }
}

#[async_trait]
impl PowerLogStore for JsonFileStore {
    async fn append_power_log(&self, new: NewPowerLog) -> Result<PowerLogRecord, StorageError> {
        let policy = self.power_log_policy;
        self.mutate(|data| data.append_power_log(new, policy, Utc::now()))
            .await
    }

    async fn list_power_logs(&self, limit: usize) -> Result<Vec<PowerLogRecord>, StorageError> {
        let policy = self.power_log_policy;
        Ok(self
            .read(|data| data.list_power_logs(limit, policy, Utc::now()))
            .await)
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.read(|data| data.find_user(username)).await)
    }

    async fn upsert_user(&self, record: UserRecord) -> Result<(), StorageError> {
        self.mutate(|data| data.upsert_user(record)).await
    }

    async fn update_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError> {
        self.mutate(|data| data.update_password_hash(username, password_hash))
            .await
    }
}
