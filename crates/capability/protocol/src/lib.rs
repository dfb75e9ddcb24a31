//! # 设备协议能力模块
//!
//! 通过 HTTP 访问机组控制器暴露的变量表：
//! - **读取**：`getvar.csv`，失败时回退 `vars.htm`
//! - **写入**：在多个 `setvar.csv` 端点上探测可用的参数格式
//!
//! ## 架构设计
//!
//! ```text
//! VarTableClient
//!       │
//!       ├── DeviceCache  (按 IP 缓存变量表原文，并发读取合并为一次)
//!       │
//!       ├── DeviceQueue  (同一 IP 的请求串行执行，不同 IP 互不阻塞)
//!       │
//!       ▼
//! DeviceTransport (HttpTransport / MockTransport)
//!       │
//!       ▼
//! parse_var_table → VarTable → VarReadout
//! ```

mod cache;
mod client;
mod error;
mod parser;
mod queue;
mod transport;
mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use cache::DeviceCache;
pub use client::{ClientConfig, VarTableClient};
pub use error::ProtocolError;
pub use parser::{CsvTable, HtmlTable, VarTableFormat, looks_like_html, parse_var_table};
pub use queue::DeviceQueue;
pub use transport::{DeviceTransport, HttpTransport};
pub use types::*;
