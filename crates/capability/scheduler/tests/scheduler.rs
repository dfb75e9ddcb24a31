use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bms_config::VarsConfig;
use bms_control::{ChillerController, SetpointOutcome, StatusResult};
use bms_scheduler::{SchedulerConfig, SweepReport, TIMER_ACTOR, TimerScheduler};
use bms_storage::{InMemoryStore, NewTimer, PowerLogStore};
use chrono::{Duration, Utc};
use domain::PowerAction;

/// 记录开关机调用的控制器；`failing` 中的 IP 写入失败。
#[derive(Default)]
struct RecordingController {
    calls: Mutex<Vec<(String, bool)>>,
    failing: HashSet<String>,
}

impl RecordingController {
    fn failing(ip: &str) -> Self {
        Self {
            failing: HashSet::from([ip.to_string()]),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChillerController for RecordingController {
    async fn probe(&self, _ip: &str) -> bool {
        true
    }

    async fn read_status(&self, _ip: &str, _vars: &VarsConfig) -> StatusResult {
        StatusResult::unreachable()
    }

    async fn set_power(&self, ip: &str, _vars: &VarsConfig, on: bool) -> bool {
        self.calls.lock().unwrap().push((ip.to_string(), on));
        !self.failing.contains(ip)
    }

    async fn set_mode(&self, _ip: &str, _vars: &VarsConfig, _mode: &str) -> bool {
        true
    }

    async fn apply_setpoint(&self, _ip: &str, _vars: &VarsConfig, _desired: f64) -> SetpointOutcome {
        SetpointOutcome::default()
    }
}

fn scheduler(
    controller: Arc<RecordingController>,
    config: SchedulerConfig,
) -> (Arc<InMemoryStore>, Arc<TimerScheduler>) {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(TimerScheduler::new(
        store.clone(),
        store.clone(),
        controller,
        Arc::new(VarsConfig::default()),
        config,
    ));
    (store, scheduler)
}

fn timer(ip: &str, mode: PowerAction, minutes_from_now: i64) -> NewTimer {
    NewTimer {
        chiller_name: format!("CH {ip}"),
        chiller_ip: ip.to_string(),
        mode,
        hours: 1.0,
        target_at: Utc::now() + Duration::minutes(minutes_from_now),
    }
}

#[tokio::test]
async fn due_timer_fires_exactly_once() {
    let controller = Arc::new(RecordingController::default());
    let (store, scheduler) = scheduler(controller.clone(), SchedulerConfig::default());
    scheduler
        .schedule(timer("10.0.0.5", PowerAction::On, -1))
        .await
        .unwrap();

    let first = scheduler.run_due_once(Utc::now()).await.unwrap();
    let second = scheduler.run_due_once(Utc::now()).await.unwrap();

    assert_eq!(first, SweepReport { fired: 1, failed: 0, skipped: 0 });
    assert_eq!(second, SweepReport::default());
    assert_eq!(controller.calls(), vec![("10.0.0.5".to_string(), true)]);
    assert!(scheduler.get_active("10.0.0.5").await.unwrap().is_none());

    let logs = store.list_power_logs(10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].unit_name, "CH 10.0.0.5");
    assert_eq!(logs[0].action, PowerAction::On);
    assert_eq!(logs[0].user.as_deref(), Some(TIMER_ACTOR));
}

#[tokio::test]
async fn future_timer_waits() {
    let controller = Arc::new(RecordingController::default());
    let (_store, scheduler) = scheduler(controller.clone(), SchedulerConfig::default());
    scheduler
        .schedule(timer("10.0.0.5", PowerAction::Off, 30))
        .await
        .unwrap();

    let report = scheduler.run_due_once(Utc::now()).await.unwrap();
    assert_eq!(report, SweepReport::default());
    assert!(controller.calls().is_empty());
    assert!(scheduler.get_active("10.0.0.5").await.unwrap().is_some());

    let later = scheduler
        .run_due_once(Utc::now() + Duration::minutes(31))
        .await
        .unwrap();
    assert_eq!(later.fired, 1);
    assert_eq!(controller.calls(), vec![("10.0.0.5".to_string(), false)]);
}

#[tokio::test]
async fn failed_command_consumes_timer_without_blocking_others() {
    let controller = Arc::new(RecordingController::failing("10.0.0.9"));
    let (store, scheduler) = scheduler(controller.clone(), SchedulerConfig::default());
    scheduler
        .schedule(timer("10.0.0.9", PowerAction::On, -2))
        .await
        .unwrap();
    scheduler
        .schedule(timer("10.0.0.5", PowerAction::Off, -1))
        .await
        .unwrap();

    let report = scheduler.run_due_once(Utc::now()).await.unwrap();
    assert_eq!(report, SweepReport { fired: 1, failed: 1, skipped: 0 });

    // 失败的任务不会重试。
    let again = scheduler.run_due_once(Utc::now()).await.unwrap();
    assert_eq!(again, SweepReport::default());
    assert_eq!(controller.calls().len(), 2);

    let logs = store.list_power_logs(10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].unit_name, "CH 10.0.0.5");
}

#[tokio::test]
async fn concurrent_sweeps_fire_once() {
    let controller = Arc::new(RecordingController::default());
    let (_store, scheduler) = scheduler(controller.clone(), SchedulerConfig::default());
    scheduler
        .schedule(timer("10.0.0.5", PowerAction::On, -1))
        .await
        .unwrap();

    let now = Utc::now();
    let (a, b) = tokio::join!(scheduler.run_due_once(now), scheduler.run_due_once(now));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.fired + b.fired, 1);
    assert_eq!(controller.calls().len(), 1);
}

#[tokio::test]
async fn schedule_keeps_existing_timers_by_default() {
    let controller = Arc::new(RecordingController::default());
    let (_store, scheduler) = scheduler(controller, SchedulerConfig::default());
    scheduler
        .schedule(timer("10.0.0.5", PowerAction::On, 10))
        .await
        .unwrap();
    let latest = scheduler
        .schedule(timer("10.0.0.5", PowerAction::Off, 20))
        .await
        .unwrap();

    let active = scheduler.get_active("10.0.0.5").await.unwrap().unwrap();
    assert_eq!(active.id, latest.id);
    assert_eq!(scheduler.cancel("10.0.0.5").await.unwrap(), 2);
    assert!(scheduler.get_active("10.0.0.5").await.unwrap().is_none());
}

#[tokio::test]
async fn schedule_supersedes_when_configured() {
    let controller = Arc::new(RecordingController::default());
    let config = SchedulerConfig {
        supersede_existing: true,
        ..SchedulerConfig::default()
    };
    let (_store, scheduler) = scheduler(controller, config);
    scheduler
        .schedule(timer("10.0.0.5", PowerAction::On, 10))
        .await
        .unwrap();
    scheduler
        .schedule(timer("10.0.0.5", PowerAction::Off, 20))
        .await
        .unwrap();

    assert_eq!(scheduler.cancel("10.0.0.5").await.unwrap(), 1);
}

#[tokio::test]
async fn schedule_rejects_invalid_input() {
    let controller = Arc::new(RecordingController::default());
    let (_store, scheduler) = scheduler(controller, SchedulerConfig::default());

    let mut bad_hours = timer("10.0.0.5", PowerAction::On, 10);
    bad_hours.hours = 0.0;
    assert!(scheduler.schedule(bad_hours).await.is_err());

    let no_ip = timer(" ", PowerAction::On, 10);
    assert!(scheduler.schedule(no_ip).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn start_runs_immediately_and_only_once() {
    let controller = Arc::new(RecordingController::default());
    let (_store, scheduler) = scheduler(controller.clone(), SchedulerConfig::default());
    scheduler
        .schedule(timer("10.0.0.5", PowerAction::On, -1))
        .await
        .unwrap();

    let handle = scheduler.start().expect("first start spawns the sweep");
    assert!(scheduler.start().is_none());

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(controller.calls().len(), 1);
    handle.abort();
}
