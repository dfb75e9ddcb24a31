//! 设备 HTTP 传输。
//!
//! 控制器只暴露最简单的 HTTP 接口，传输层只负责 GET 与表单 POST，
//! 不做重试；重试、地址探测由 `client` 决定。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::ProtocolError;

/// 设备传输接口，便于在测试中替换为模拟控制器。
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// GET 请求，2xx 时返回响应体文本。
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, ProtocolError>;

    /// `application/x-www-form-urlencoded` POST，2xx 时返回响应体文本。
    async fn post_form(
        &self,
        url: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<String, ProtocolError>;
}

/// 基于 reqwest 的传输实现。
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ProtocolError> {
        let client = Client::builder()
            .build()
            .map_err(|err| ProtocolError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, ProtocolError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProtocolError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    async fn post_form(
        &self,
        url: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<String, ProtocolError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.to_string())
            .timeout(timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProtocolError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}
