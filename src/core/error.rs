//! 生成流水线错误类型
//!
//! 两类上游错误对调用方可见：客户端未初始化（未调用 setup 即使用）与远端服务错误（HTTP 非 2xx、传输失败、响应格式不符）。
//! 两者都不在本地重试，原样传播到流水线调用方。

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageGenError {
    /// 网络客户端在 setup 之前被使用；此时不会发出任何请求
    #[error("{0} client is not initialized. Call setup() before using it")]
    ClientNotInitialized(&'static str),

    #[error("{service} request failed{http}: {message}", http = .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    RemoteService {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// 单个阶段内工具调用轮数超出上限
    #[error("Agent exceeded {0} tool-call rounds")]
    ToolLoopExceeded(usize),

    /// 同一个 PageGenerator 只能运行一次，线程不跨运行复用
    #[error("Page generation on thread {0} has already been started")]
    RunAlreadyStarted(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl PageGenError {
    pub fn remote(service: &'static str, message: impl Into<String>) -> Self {
        Self::RemoteService {
            service,
            status: None,
            message: message.into(),
        }
    }

    pub fn remote_status(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::RemoteService {
            service,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn is_remote_service(&self) -> bool {
        matches!(self, Self::RemoteService { .. })
    }

    pub fn is_client_not_initialized(&self) -> bool {
        matches!(self, Self::ClientNotInitialized(_))
    }

    /// 远端返回的 HTTP 状态码（若有）
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteService { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<config::ConfigError> for PageGenError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
