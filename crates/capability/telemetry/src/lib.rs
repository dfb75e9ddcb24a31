//! 追踪、请求 ID 与进程级计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub device_fetches: u64,
    pub device_fetch_failures: u64,
    pub cache_hits: u64,
    pub cache_joins: u64,
    pub device_writes: u64,
    pub device_write_failures: u64,
    pub setpoint_verify_failures: u64,
    pub setpoint_unlock_attempts: u64,
    pub timers_fired: u64,
    pub timer_command_failures: u64,
}

/// 进程级计数指标。
#[derive(Default)]
pub struct TelemetryMetrics {
    device_fetches: AtomicU64,
    device_fetch_failures: AtomicU64,
    cache_hits: AtomicU64,
    cache_joins: AtomicU64,
    device_writes: AtomicU64,
    device_write_failures: AtomicU64,
    setpoint_verify_failures: AtomicU64,
    setpoint_unlock_attempts: AtomicU64,
    timers_fired: AtomicU64,
    timer_command_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            device_fetches: self.device_fetches.load(Ordering::Relaxed),
            device_fetch_failures: self.device_fetch_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_joins: self.cache_joins.load(Ordering::Relaxed),
            device_writes: self.device_writes.load(Ordering::Relaxed),
            device_write_failures: self.device_write_failures.load(Ordering::Relaxed),
            setpoint_verify_failures: self.setpoint_verify_failures.load(Ordering::Relaxed),
            setpoint_unlock_attempts: self.setpoint_unlock_attempts.load(Ordering::Relaxed),
            timers_fired: self.timers_fired.load(Ordering::Relaxed),
            timer_command_failures: self.timer_command_failures.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录一次真实的设备变量表读取（未命中缓存）。
pub fn record_device_fetch(success: bool) {
    let metrics = metrics();
    metrics.device_fetches.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.device_fetch_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// 记录缓存命中（TTL 内直接返回）。
pub fn record_cache_hit() {
    metrics().cache_hits.fetch_add(1, Ordering::Relaxed);
}

/// 记录加入在途读取的次数。
pub fn record_cache_join() {
    metrics().cache_joins.fetch_add(1, Ordering::Relaxed);
}

/// 记录变量写入结果（一次写入包含全部 URL 探测）。
pub fn record_device_write(success: bool) {
    let metrics = metrics();
    metrics.device_writes.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.device_write_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// 记录设定温度读回校验失败。
pub fn record_setpoint_verify_failure() {
    metrics()
        .setpoint_verify_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录解锁尝试。
pub fn record_setpoint_unlock_attempt() {
    metrics()
        .setpoint_unlock_attempts
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录定时任务触发结果。
pub fn record_timer_fired(success: bool) {
    let metrics = metrics();
    metrics.timers_fired.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.timer_command_failures.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = TelemetryMetrics::new();
        metrics.device_fetches.fetch_add(2, Ordering::Relaxed);
        metrics.timer_command_failures.fetch_add(1, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.device_fetches, 2);
        assert_eq!(snapshot.timer_command_failures, 1);
        assert_eq!(snapshot.cache_hits, 0);
    }

    #[test]
    fn request_ids_are_distinct() {
        let ids = new_request_ids();
        assert_ne!(ids.request_id, ids.trace_id);
    }
}
