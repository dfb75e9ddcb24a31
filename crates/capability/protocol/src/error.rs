//! 协议错误类型定义

/// 设备通信错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 连接错误（拒绝连接、DNS、TLS 等）
    #[error("connection error: {0}")]
    Connection(String),

    /// 设备返回非 2xx 状态码
    #[error("unexpected status: {0}")]
    Status(u16),

    /// 响应体读取错误
    #[error("body error: {0}")]
    Body(String),

    /// 超时错误
    #[error("timeout: {0}")]
    Timeout(String),

    /// 客户端构建错误
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ProtocolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProtocolError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            ProtocolError::Status(status.as_u16())
        } else if err.is_body() || err.is_decode() {
            ProtocolError::Body(err.to_string())
        } else {
            ProtocolError::Connection(err.to_string())
        }
    }
}
