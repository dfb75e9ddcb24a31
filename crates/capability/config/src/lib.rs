//! 应用运行配置加载。

mod dashboard;

pub use dashboard::{ChillerSeed, DEFAULT_CHILLER_NAME, DashboardConfig, VarsConfig};

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 持久化后端。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// `<data_dir>/db.json`，原子写。
    File,
    /// 进程内存，重启即丢失。
    Memory,
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub auth_secret: String,
    pub session_ttl_seconds: u64,
    pub storage_backend: StorageBackend,
    pub data_dir: String,
    pub dashboard_config_path: String,
    pub device_cache_ttl_ms: u64,
    pub device_read_timeout_ms: u64,
    pub device_write_timeout_ms: u64,
    pub timer_sweep_interval_seconds: u64,
    pub timer_supersede: bool,
    pub power_log_retention_days: u64,
    pub power_log_max_entries: usize,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth_secret = env::var("BMS_AUTH_SECRET")
            .map_err(|_| ConfigError::Missing("BMS_AUTH_SECRET".to_string()))?;
        let http_addr = env::var("BMS_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let session_ttl_seconds = read_u64_with_default("BMS_SESSION_TTL_SECONDS", 7 * 24 * 3600)?;
        let storage_backend = read_storage_backend("BMS_STORAGE")?;
        let data_dir = read_optional("BMS_DATA_DIR").unwrap_or_else(|| "data".to_string());
        let dashboard_config_path = read_optional("BMS_DASHBOARD_CONFIG")
            .unwrap_or_else(|| "../assets/data/dashboard.config.json".to_string());
        let device_cache_ttl_ms = read_u64_with_default("BMS_DEVICE_CACHE_TTL_MS", 5_000)?;
        let device_read_timeout_ms = read_u64_with_default("BMS_DEVICE_READ_TIMEOUT_MS", 4_000)?;
        let device_write_timeout_ms = read_u64_with_default("BMS_DEVICE_WRITE_TIMEOUT_MS", 8_000)?;
        let timer_sweep_interval_seconds =
            read_u64_with_default("BMS_TIMER_SWEEP_INTERVAL_SECONDS", 15)?.max(1);
        let timer_supersede = read_bool_with_default("BMS_TIMER_SUPERSEDE", false);
        let power_log_retention_days = read_u64_with_default("BMS_POWER_LOG_RETENTION_DAYS", 30)?;
        let power_log_max_entries = read_u64_with_default("BMS_POWER_LOG_MAX_ENTRIES", 1_000)?;

        Ok(Self {
            http_addr,
            auth_secret,
            session_ttl_seconds,
            storage_backend,
            data_dir,
            dashboard_config_path,
            device_cache_ttl_ms,
            device_read_timeout_ms,
            device_write_timeout_ms,
            timer_sweep_interval_seconds,
            timer_supersede,
            power_log_retention_days,
            power_log_max_entries: usize::try_from(power_log_max_entries).map_err(|_| {
                ConfigError::Invalid(
                    "BMS_POWER_LOG_MAX_ENTRIES".to_string(),
                    power_log_max_entries.to_string(),
                )
            })?,
        })
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}

fn read_storage_backend(key: &str) -> Result<StorageBackend, ConfigError> {
    match read_optional(key) {
        None => Ok(StorageBackend::File),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid(key.to_string(), value)),
        },
    }
}
