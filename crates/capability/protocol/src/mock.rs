//! 内存模拟设备，供测试使用（`mock` 特性对下游 crate 开放）。
//!
//! 读取返回 CSV 变量表（`html_only` 时只提供 vars.htm），写入只在
//! 配置的端点上被接受，其余端点返回 404。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProtocolError;
use crate::transport::DeviceTransport;

/// 一台模拟控制器。
#[derive(Debug, Clone)]
pub struct MockDevice {
    vars: Vec<(String, String)>,
    reachable: bool,
    csv_enabled: bool,
    write_path: String,
    ignore_dot_decimals: bool,
    pinned: HashMap<String, String>,
    lock: Option<(String, String)>,
    latency: Duration,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self {
            vars: Vec::new(),
            reachable: true,
            csv_enabled: true,
            write_path: "/setvar.csv".to_string(),
            ignore_dot_decimals: false,
            pinned: HashMap::new(),
            lock: None,
            latency: Duration::ZERO,
        }
    }
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.vars.push((name, value)),
        }
        self
    }

    /// 设备在网络上不可达。
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// 没有 getvar.csv，只能通过 vars.htm 读取。
    pub fn html_only(mut self) -> Self {
        self.csv_enabled = false;
        self
    }

    /// 唯一接受写入的路径。
    pub fn write_path(mut self, path: impl Into<String>) -> Self {
        self.write_path = path.into();
        self
    }

    /// 接受带小数点的写入但不生效（只认逗号小数）。
    pub fn ignore_dot_decimals(mut self) -> Self {
        self.ignore_dot_decimals = true;
        self
    }

    /// 读回值固定为 `value`，写入不影响读取结果。
    pub fn pin(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pinned.insert(name.into(), value.into());
        self
    }

    /// 除 `var` 外的写入都被忽略，直到 `var` 被写为 `code`。
    pub fn locked_by(mut self, var: impl Into<String>, code: impl Into<String>) -> Self {
        self.lock = Some((var.into(), code.into()));
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, name: &str, value: &str) {
        match self.vars.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.vars.push((name.to_string(), value.to_string())),
        }
    }

    fn readback(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = self
            .vars
            .iter()
            .map(|(name, value)| {
                let value = self.pinned.get(name).unwrap_or(value);
                (name.clone(), value.clone())
            })
            .collect();
        for (name, value) in &self.pinned {
            if !rows.iter().any(|(n, _)| n == name) {
                rows.push((name.clone(), value.clone()));
            }
        }
        rows
    }

    fn render_csv(&self) -> String {
        let mut out = String::from("name,id,desc,type,access,val\n");
        for (idx, (name, value)) in self.readback().iter().enumerate() {
            out.push_str(&format!("{name},{},,REAL,RW,\"{value}\"\n", idx + 1));
        }
        out
    }

    fn render_html(&self) -> String {
        let mut out = String::from("<html><body><table id=\"varsTable\"><tbody>");
        for (idx, (name, value)) in self.readback().iter().enumerate() {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{name}</td><td>REAL</td><td>{value}</td></tr>",
                idx + 1
            ));
        }
        out.push_str("</tbody></table></body></html>");
        out
    }

    fn apply_write(&mut self, name: &str, value: &str) {
        if let Some((lock_var, code)) = &self.lock {
            if name != lock_var && self.get(lock_var) != Some(code.as_str()) {
                return;
            }
        }
        if self.ignore_dot_decimals && value.contains('.') {
            return;
        }
        self.set(name, value);
    }
}

/// 记录下来的一次请求。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
}

/// 一次被接受的写入（无论是否生效）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWrite {
    pub ip: String,
    pub name: String,
    pub value: String,
}

/// 按 IP 路由到模拟设备的传输实现。
#[derive(Debug, Default)]
pub struct MockTransport {
    devices: Mutex<HashMap<String, MockDevice>>,
    requests: Mutex<Vec<MockRequest>>,
    writes: Mutex<Vec<MockWrite>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, ip: impl Into<String>, device: MockDevice) -> Self {
        self.insert_device(ip, device);
        self
    }

    pub fn insert_device(&self, ip: impl Into<String>, device: MockDevice) {
        if let Ok(mut devices) = self.devices.lock() {
            devices.insert(ip.into(), device);
        }
    }

    /// 直接修改设备上的变量（模拟现场操作）。
    pub fn set_var(&self, ip: &str, name: &str, value: &str) {
        if let Ok(mut devices) = self.devices.lock() {
            if let Some(device) = devices.get_mut(ip) {
                device.set(name, value);
            }
        }
    }

    /// 设备上变量的实际存储值（不受 `pin` 影响）。
    pub fn var(&self, ip: &str, name: &str) -> Option<String> {
        let devices = self.devices.lock().ok()?;
        devices.get(ip)?.get(name).map(str::to_string)
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    /// 对 `ip` 的读取请求数（getvar.csv 与 vars.htm）。
    pub fn read_count(&self, ip: &str) -> usize {
        self.requests()
            .iter()
            .filter(|req| {
                let (host, path, _) = split_url(&req.url);
                host == ip && is_read_path(path)
            })
            .count()
    }

    /// 对 `ip` 的写入请求数（含被拒绝的尝试）。
    pub fn write_request_count(&self, ip: &str) -> usize {
        self.requests()
            .iter()
            .filter(|req| {
                let (host, path, _) = split_url(&req.url);
                host == ip && !is_read_path(path)
            })
            .count()
    }

    /// 被接受的写入，按时间顺序。
    pub fn writes(&self) -> Vec<MockWrite> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }

    /// 对某个变量写入过的值，按时间顺序。
    pub fn written_values(&self, ip: &str, name: &str) -> Vec<String> {
        self.writes()
            .into_iter()
            .filter(|w| w.ip == ip && w.name == name)
            .map(|w| w.value)
            .collect()
    }

    fn record(&self, method: &'static str, url: &str, body: Option<&str>) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(MockRequest {
                method,
                url: url.to_string(),
                body: body.map(str::to_string),
            });
        }
    }

    fn latency_of(&self, ip: &str) -> Duration {
        self.devices
            .lock()
            .ok()
            .and_then(|devices| devices.get(ip).map(|d| d.latency))
            .unwrap_or_default()
    }

    fn handle(&self, ip: &str, path: &str, params: Option<&str>) -> Result<String, ProtocolError> {
        let mut devices = self
            .devices
            .lock()
            .map_err(|_| ProtocolError::Connection("mock poisoned".to_string()))?;
        let device = match devices.get_mut(ip) {
            Some(device) if device.reachable => device,
            _ => return Err(ProtocolError::Connection(format!("{ip} refused"))),
        };

        match (path, params) {
            ("/getvar.csv", None) if device.csv_enabled => Ok(device.render_csv()),
            ("/vars.htm", None) => Ok(device.render_html()),
            (path, Some(params)) if path == device.write_path => {
                let (name, value) = parse_write(params).ok_or(ProtocolError::Status(400))?;
                device.apply_write(&name, &value);
                if let Ok(mut writes) = self.writes.lock() {
                    writes.push(MockWrite {
                        ip: ip.to_string(),
                        name,
                        value,
                    });
                }
                Ok("OK".to_string())
            }
            _ => Err(ProtocolError::Status(404)),
        }
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<String, ProtocolError> {
        self.record("GET", url, None);
        let (ip, path, query) = split_url(url);
        let latency = self.latency_of(ip);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.handle(ip, path, query)
    }

    async fn post_form(
        &self,
        url: &str,
        body: &str,
        _timeout: Duration,
    ) -> Result<String, ProtocolError> {
        self.record("POST", url, Some(body));
        let (ip, path, _) = split_url(url);
        let latency = self.latency_of(ip);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.handle(ip, path, Some(body))
    }
}

fn is_read_path(path: &str) -> bool {
    path == "/getvar.csv" || path == "/vars.htm"
}

/// `http://host/path?query` -> (host, path, query)
fn split_url(url: &str) -> (&str, &str, Option<&str>) {
    let rest = url.strip_prefix("http://").unwrap_or(url);
    let (host, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, "/"),
    };
    match path.split_once('?') {
        Some((path, query)) => (host, path, Some(query)),
        None => (host, path, None),
    }
}

fn parse_write(params: &str) -> Option<(String, String)> {
    let pairs: Vec<(String, String)> = params
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = urlencoding::decode(key).ok()?.into_owned();
            let value = urlencoding::decode(value).ok()?.into_owned();
            Some((key, value))
        })
        .collect();
    let lookup = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };

    if let Some(name) = lookup("name") {
        return Some((name, lookup("value").or_else(|| lookup("val"))?));
    }
    if let Some(name) = lookup("id") {
        return Some((name, lookup("value")?));
    }
    if let Some(name) = lookup("var") {
        return Some((name, lookup("val")?));
    }
    match pairs.as_slice() {
        [(name, value)] => Some((name.clone(), value.clone())),
        _ => None,
    }
}
