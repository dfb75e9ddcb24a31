//! # 定时任务能力模块
//!
//! 在指定时刻对机组执行一次开机或关机：
//!
//! ```text
//! schedule ──▶ TimerStore (active)
//!                   │
//!     interval ──▶ run_due_once ──▶ claim_timer (active → inactive)
//!                   │                    │
//!                   │                    ▼
//!                   │            ChillerController::set_power
//!                   │                    │
//!                   └──────────────▶ PowerLogStore (user = "timer")
//! ```
//!
//! 先认领再下发：认领失败的任务跳过，下发失败的任务也已被消耗，不会重试。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bms_config::VarsConfig;
use bms_control::ChillerController;
use bms_storage::{NewPowerLog, NewTimer, PowerLogStore, StorageError, TimerRecord, TimerStore};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// 定时触发写入开关机日志时使用的操作人。
pub const TIMER_ACTOR: &str = "timer";

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("missing chiller ip")]
    MissingIp,
    #[error("invalid hours: {0}")]
    InvalidHours(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// 扫描间隔
    pub interval: Duration,
    /// 新建任务时是否停用同一 IP 上已有的 active 任务
    pub supersede_existing: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            supersede_existing: false,
        }
    }
}

/// 一次扫描的统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// 命令写入成功
    pub fired: usize,
    /// 已认领但命令失败（或认领时存储出错）
    pub failed: usize,
    /// 被其他扫描抢先认领
    pub skipped: usize,
}

enum TimerOutcome {
    Fired,
    Failed,
    Skipped,
}

pub struct TimerScheduler {
    timers: Arc<dyn TimerStore>,
    power_logs: Arc<dyn PowerLogStore>,
    controller: Arc<dyn ChillerController>,
    vars: Arc<VarsConfig>,
    config: SchedulerConfig,
    started: AtomicBool,
}

impl TimerScheduler {
    pub fn new(
        timers: Arc<dyn TimerStore>,
        power_logs: Arc<dyn PowerLogStore>,
        controller: Arc<dyn ChillerController>,
        vars: Arc<VarsConfig>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            timers,
            power_logs,
            controller,
            vars,
            config,
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// 保存一个 active 定时任务。
    pub async fn schedule(&self, new: NewTimer) -> Result<TimerRecord, SchedulerError> {
        if new.chiller_ip.trim().is_empty() {
            return Err(SchedulerError::MissingIp);
        }
        if !new.hours.is_finite() || new.hours <= 0.0 {
            return Err(SchedulerError::InvalidHours(new.hours));
        }

        if self.config.supersede_existing {
            let replaced = self.timers.deactivate_timers_for_ip(&new.chiller_ip).await?;
            if replaced > 0 {
                info!(target: "bms.scheduler", chiller_ip = %new.chiller_ip, replaced = replaced, "timers_superseded");
            }
        }

        let record = self.timers.create_timer(new).await?;
        info!(
            target: "bms.scheduler",
            timer_id = %record.id,
            chiller_ip = %record.chiller_ip,
            mode = %record.mode,
            target_at = %record.target_at.to_rfc3339(),
            "timer_scheduled"
        );
        Ok(record)
    }

    /// 停用 IP 上全部 active 任务，返回数量。
    pub async fn cancel(&self, chiller_ip: &str) -> Result<usize, SchedulerError> {
        let cancelled = self.timers.deactivate_timers_for_ip(chiller_ip).await?;
        info!(target: "bms.scheduler", chiller_ip = %chiller_ip, cancelled = cancelled, "timers_cancelled");
        Ok(cancelled)
    }

    pub async fn get_active(&self, chiller_ip: &str) -> Result<Option<TimerRecord>, SchedulerError> {
        Ok(self.timers.find_active_timer(chiller_ip).await?)
    }

    /// 执行一次到期扫描。各任务并发处理，单个任务失败不影响其他任务。
    pub async fn run_due_once(&self, now: DateTime<Utc>) -> Result<SweepReport, SchedulerError> {
        let due = self.timers.list_due_timers(now).await?;
        if due.is_empty() {
            return Ok(SweepReport::default());
        }

        let outcomes =
            futures::future::join_all(due.iter().map(|timer| self.fire(timer, now))).await;
        let mut report = SweepReport::default();
        for outcome in outcomes {
            match outcome {
                TimerOutcome::Fired => report.fired += 1,
                TimerOutcome::Failed => report.failed += 1,
                TimerOutcome::Skipped => report.skipped += 1,
            }
        }
        info!(
            target: "bms.scheduler",
            due = due.len(),
            fired = report.fired,
            failed = report.failed,
            skipped = report.skipped,
            "timer_sweep_completed"
        );
        Ok(report)
    }

    async fn fire(&self, timer: &TimerRecord, now: DateTime<Utc>) -> TimerOutcome {
        match self.timers.claim_timer(&timer.id).await {
            Ok(true) => {}
            Ok(false) => return TimerOutcome::Skipped,
            Err(err) => {
                warn!(target: "bms.scheduler", timer_id = %timer.id, error = %err, "timer_claim_failed");
                return TimerOutcome::Failed;
            }
        }

        let ok = self
            .controller
            .set_power(&timer.chiller_ip, &self.vars, timer.mode.is_on())
            .await;
        bms_telemetry::record_timer_fired(ok);
        if !ok {
            warn!(
                target: "bms.scheduler",
                timer_id = %timer.id,
                chiller_ip = %timer.chiller_ip,
                mode = %timer.mode,
                "timer_command_failed"
            );
            return TimerOutcome::Failed;
        }

        info!(
            target: "bms.scheduler",
            timer_id = %timer.id,
            chiller_ip = %timer.chiller_ip,
            mode = %timer.mode,
            "timer_fired"
        );
        let entry = NewPowerLog {
            unit_name: timer.chiller_name.clone(),
            action: timer.mode,
            at: now,
            user: Some(TIMER_ACTOR.to_string()),
        };
        if let Err(err) = self.power_logs.append_power_log(entry).await {
            warn!(target: "bms.scheduler", timer_id = %timer.id, error = %err, "timer_power_log_failed");
        }
        TimerOutcome::Fired
    }

    /// 启动周期扫描（首次扫描立即执行）。重复调用返回 `None`。
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return None;
        }
        let scheduler = Arc::clone(self);
        info!(
            target: "bms.scheduler",
            interval_ms = scheduler.config.interval.as_millis() as u64,
            supersede = scheduler.config.supersede_existing,
            "timer_sweep_started"
        );
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = scheduler.run_due_once(Utc::now()).await {
                    warn!(target: "bms.scheduler", error = %err, "timer_sweep_failed");
                }
            }
        }))
    }
}
