//! 变量表客户端：读取（经缓存与队列）、批量取值、写变量（端点探测）。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::DeviceCache;
use crate::parser::parse_var_table;
use crate::queue::DeviceQueue;
use crate::transport::DeviceTransport;
use crate::types::{VarReadout, VarTable, WriteAttempt, read_urls, write_attempts};

/// 客户端参数。
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    /// 变量表缓存有效期
    pub cache_ttl: Duration,
    /// 单次读取超时
    pub read_timeout: Duration,
    /// 单次写入请求超时
    pub write_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_millis(5_000),
            read_timeout: Duration::from_millis(4_000),
            write_timeout: Duration::from_millis(8_000),
        }
    }
}

/// 变量表客户端。
///
/// 所有对同一 IP 的请求（读取与写入）都经过同一个队列串行执行。
pub struct VarTableClient {
    transport: Arc<dyn DeviceTransport>,
    cache: DeviceCache,
    queue: DeviceQueue,
    config: ClientConfig,
}

impl VarTableClient {
    pub fn new(transport: Arc<dyn DeviceTransport>, config: ClientConfig) -> Self {
        Self {
            transport,
            cache: DeviceCache::new(config.cache_ttl),
            queue: DeviceQueue::new(),
            config,
        }
    }

    pub fn cache(&self) -> &DeviceCache {
        &self.cache
    }

    pub fn queue(&self) -> &DeviceQueue {
        &self.queue
    }

    /// 变量表原文（经缓存）；设备不可达时返回 `None`。
    pub async fn fetch_text(&self, ip: &str) -> Option<String> {
        let ip = ip.trim().to_string();
        let transport = Arc::clone(&self.transport);
        let queue = self.queue.clone();
        let timeout = self.config.read_timeout;
        let key = ip.clone();
        let fetcher = move || {
            let target = key.clone();
            queue.enqueue(&key, move || read_table(transport, target, timeout))
        };
        self.cache.fetch(&ip, fetcher).await
    }

    /// 设备是否可达。
    pub async fn probe(&self, ip: &str) -> bool {
        self.fetch_text(ip).await.is_some()
    }

    /// 一次取回多个变量（同一次读取的快照）。
    pub async fn batch_read(&self, ip: &str, keys: &[&str]) -> VarReadout {
        match self.fetch_text(ip).await {
            Some(text) => {
                let table = VarTable::from_rows(parse_var_table(&text));
                VarReadout::from_table(&table, keys)
            }
            None => VarReadout::unreachable(),
        }
    }

    /// 跳过缓存结果重新读取，用于写入后的读回校验。
    pub async fn read_fresh(&self, ip: &str, keys: &[&str]) -> VarReadout {
        self.cache.invalidate(ip);
        self.batch_read(ip, keys).await
    }

    /// 写变量：依次尝试各端点与参数格式，任一请求返回 2xx 即视为成功。
    pub async fn write_var(&self, ip: &str, name: &str, value: &str) -> bool {
        let ip = ip.trim();
        if ip.is_empty() || name.is_empty() {
            return false;
        }

        let attempts = write_attempts(ip, name, value);
        let transport = Arc::clone(&self.transport);
        let timeout = self.config.write_timeout;
        let log_ip = ip.to_string();
        let ok = self
            .queue
            .enqueue(ip, move || async move {
                for attempt in attempts {
                    let (url, result) = match &attempt {
                        WriteAttempt::Get { url } => (url, transport.get(url, timeout).await),
                        WriteAttempt::PostForm { url, body } => {
                            (url, transport.post_form(url, body, timeout).await)
                        }
                    };
                    match result {
                        Ok(_) => {
                            debug!(target: "bms.protocol", ip = %log_ip, url = %url, "write_attempt_accepted");
                            return true;
                        }
                        Err(err) => {
                            debug!(target: "bms.protocol", ip = %log_ip, url = %url, error = %err, "write_attempt_failed");
                        }
                    }
                }
                false
            })
            .await;

        bms_telemetry::record_device_write(ok);
        if ok {
            // 写入成功后旧的变量表不再可信。
            self.cache.invalidate(ip);
            info!(target: "bms.protocol", ip = %ip, var = %name, value = %value, "var_written");
        } else {
            warn!(target: "bms.protocol", ip = %ip, var = %name, value = %value, "var_write_failed");
        }
        ok
    }
}

async fn read_table(
    transport: Arc<dyn DeviceTransport>,
    ip: String,
    timeout: Duration,
) -> Option<String> {
    for url in read_urls(&ip) {
        match transport.get(&url, timeout).await {
            Ok(body) => {
                bms_telemetry::record_device_fetch(true);
                debug!(target: "bms.protocol", ip = %ip, url = %url, bytes = body.len(), "var_table_fetched");
                return Some(body);
            }
            Err(err) => {
                debug!(target: "bms.protocol", ip = %ip, url = %url, error = %err, "var_table_attempt_failed");
            }
        }
    }
    bms_telemetry::record_device_fetch(false);
    warn!(target: "bms.protocol", ip = %ip, "device_unreachable");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDevice, MockTransport};

    fn client(mock: &Arc<MockTransport>) -> VarTableClient {
        VarTableClient::new(mock.clone(), ClientConfig::default())
    }

    #[tokio::test]
    async fn batch_read_returns_requested_keys() {
        let mock = Arc::new(MockTransport::new().with_device(
            "10.0.0.5",
            MockDevice::new()
                .var("SystemStatus.Ctrl", "1")
                .var("SetTyp", "3"),
        ));
        let client = client(&mock);

        let readout = client
            .batch_read("10.0.0.5", &["SystemStatus.Ctrl", "Missing"])
            .await;

        assert!(readout.reachable);
        assert_eq!(readout.get("SystemStatus.Ctrl"), Some("1"));
        assert_eq!(readout.get("SetTyp"), None);
        assert_eq!(readout.get("Missing"), None);
    }

    #[tokio::test]
    async fn html_endpoint_is_used_when_csv_missing() {
        let mock = Arc::new(MockTransport::new().with_device(
            "10.0.0.5",
            MockDevice::new().var("SetTyp", "2").html_only(),
        ));
        let client = client(&mock);

        let readout = client.batch_read("10.0.0.5", &["SetTyp"]).await;
        assert_eq!(readout.get("SetTyp"), Some("2"));
        assert_eq!(mock.read_count("10.0.0.5"), 2);
    }

    #[tokio::test]
    async fn unreachable_device_reads_nothing() {
        let mock = Arc::new(MockTransport::new());
        let client = client(&mock);

        assert!(!client.probe("10.0.0.9").await);
        let readout = client.batch_read("10.0.0.9", &["SetTyp"]).await;
        assert!(!readout.reachable);
    }

    #[tokio::test]
    async fn write_probes_until_an_endpoint_accepts() {
        let mock = Arc::new(MockTransport::new().with_device(
            "10.0.0.5",
            MockDevice::new().var("SetTyp", "0").write_path("/pgd/setvar.csv"),
        ));
        let client = client(&mock);

        assert!(client.write_var("10.0.0.5", "SetTyp", "3").await);
        assert_eq!(mock.var("10.0.0.5", "SetTyp").as_deref(), Some("3"));
        // /setvar.csv 的 5 种 GET 与 4 种 POST 都失败后，/pgd/setvar.csv 的第一种 GET 成功。
        assert_eq!(mock.write_request_count("10.0.0.5"), 10);
    }

    #[tokio::test]
    async fn write_invalidates_cached_table() {
        let mock = Arc::new(MockTransport::new().with_device(
            "10.0.0.5",
            MockDevice::new().var("SetTyp", "0"),
        ));
        let client = client(&mock);

        assert_eq!(
            client.batch_read("10.0.0.5", &["SetTyp"]).await.get("SetTyp"),
            Some("0")
        );
        assert!(client.write_var("10.0.0.5", "SetTyp", "3").await);
        assert_eq!(
            client.batch_read("10.0.0.5", &["SetTyp"]).await.get("SetTyp"),
            Some("3")
        );
    }

    #[tokio::test]
    async fn write_to_unreachable_device_fails() {
        let mock = Arc::new(MockTransport::new());
        let client = client(&mock);
        assert!(!client.write_var("10.0.0.9", "SetTyp", "3").await);
        assert!(!client.write_var("", "SetTyp", "3").await);
    }
}
