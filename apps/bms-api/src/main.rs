use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bms_api::{AppState, create_app};
use bms_auth::{AuthService, SessionManager};
use bms_config::{AppConfig, DashboardConfig, StorageBackend};
use bms_control::{ChillerAdapter, ChillerController};
use bms_protocol::{ClientConfig, HttpTransport, VarTableClient};
use bms_scheduler::{SchedulerConfig, TimerScheduler};
use bms_storage::{
    ChillerStore, InMemoryStore, JsonFileStore, PowerLogPolicy, PowerLogStore, TimerStore,
    UserStore,
};
use bms_telemetry::init_tracing;
use tracing::info;

type Stores = (
    Arc<dyn UserStore>,
    Arc<dyn ChillerStore>,
    Arc<dyn TimerStore>,
    Arc<dyn PowerLogStore>,
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    // 变量映射与初始机组清单
    let dashboard = DashboardConfig::load(&config.dashboard_config_path);

    let policy = PowerLogPolicy {
        retention: chrono::Duration::days(i64::try_from(config.power_log_retention_days)?),
        max_entries: config.power_log_max_entries,
    };
    let (users, chillers, timers, power_logs): Stores = match config.storage_backend {
        StorageBackend::File => {
            let path = Path::new(&config.data_dir).join("db.json");
            let store = Arc::new(JsonFileStore::open(path, policy).await?);
            info!(target: "bms.api", path = %store.path().display(), "storage_file_opened");
            let stores: Stores = (store.clone(), store.clone(), store.clone(), store);
            stores
        }
        StorageBackend::Memory => {
            let store = Arc::new(InMemoryStore::new().with_power_log_policy(policy));
            info!(target: "bms.api", "storage_in_memory");
            let stores: Stores = (store.clone(), store.clone(), store.clone(), store);
            stores
        }
    };

    let sessions = SessionManager::new(config.auth_secret.clone(), config.session_ttl_seconds);
    let auth = Arc::new(AuthService::new(users, sessions));
    let created = auth.ensure_default_users().await?;
    if created > 0 {
        info!(target: "bms.api", created = created, "default_users_seeded");
    }

    // 设备访问链路：HTTP 传输 → 缓存/队列 → 控制适配器
    let client = Arc::new(VarTableClient::new(
        Arc::new(HttpTransport::new()?),
        ClientConfig {
            cache_ttl: Duration::from_millis(config.device_cache_ttl_ms),
            read_timeout: Duration::from_millis(config.device_read_timeout_ms),
            write_timeout: Duration::from_millis(config.device_write_timeout_ms),
        },
    ));
    let controller: Arc<dyn ChillerController> = Arc::new(ChillerAdapter::new(client));
    let vars = Arc::new(dashboard.vars);

    // 定时任务只在这里构造并启动一次
    let scheduler = Arc::new(TimerScheduler::new(
        timers,
        power_logs.clone(),
        controller.clone(),
        vars.clone(),
        SchedulerConfig {
            interval: Duration::from_secs(config.timer_sweep_interval_seconds),
            supersede_existing: config.timer_supersede,
        },
    ));
    let _sweep = scheduler.start();

    let state = AppState {
        auth,
        chillers,
        power_logs,
        scheduler,
        controller,
        vars,
        chiller_seeds: Arc::new(dashboard.chillers),
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "bms.api", addr = %config.http_addr, "http_listening");
    axum::serve(listener, app).await?;
    Ok(())
}
