//! DeepSeek API 客户端（OpenAI 兼容格式）
//!
//! 通过 async_openai 的 BYOT（bring your own types）接口调用 chat/completions，
//! 请求与响应使用本 crate 的线路类型，以便携带 tools / tool_calls 并解析流式增量。
//! - Base URL: https://api.deepseek.com
//! - 模型: deepseek-chat (常规对话), deepseek-reasoner (思考模式)

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::Client;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};

use crate::core::PageGenError;
use crate::llm::{ChatBackend, ChatChunk, ChatRequest, ChatResponse, ChunkStream};

/// DeepSeek API 常量
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const DEEPSEEK_REASONER: &str = "deepseek-reasoner";

const SERVICE: &str = "deepseek";

/// DeepSeek 客户端：持有 async_openai Client 与 model 名，并累计非流式调用的 token 用量
pub struct DeepSeekClient {
    client: Client<OpenAIConfig>,
    model: String,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
}

impl DeepSeekClient {
    pub fn new(base_url: &str, model: &str, api_key: &str, connect_timeout: Duration) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(base_url.trim_end_matches('/'))
            .with_api_key(api_key);

        // 流式响应可能持续数分钟，只限制建连时间
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_default();

        Self {
            client: Client::with_config(config).with_http_client(http),
            model: model.to_string(),
            prompt_tokens: AtomicU64::new(0),
            completion_tokens: AtomicU64::new(0),
        }
    }

    /// 累计 token 使用：(prompt, completion)
    pub fn token_usage(&self) -> (u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
        )
    }

    fn prepare(&self, mut request: ChatRequest, stream: bool) -> ChatRequest {
        if request.model.is_empty() {
            request.model = self.model.clone();
        }
        request.stream = stream;
        request
    }
}

/// 上游非 2xx 响应被 async_openai 解析为 `ApiError`，其中不含 HTTP 状态码，
/// 因此 DeepSeek 错误的 `status()` 只在传输层带状态时才有值
fn to_remote(e: OpenAIError) -> PageGenError {
    match e {
        OpenAIError::Reqwest(err) => match err.status() {
            Some(status) => PageGenError::remote_status(SERVICE, status.as_u16(), err.to_string()),
            None => PageGenError::remote(SERVICE, err.to_string()),
        },
        other => PageGenError::remote(SERVICE, other.to_string()),
    }
}

#[async_trait]
impl ChatBackend for DeepSeekClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, PageGenError> {
        let request = self.prepare(request, false);
        let response: ChatResponse = self
            .client
            .chat()
            .create_byot(request)
            .await
            .map_err(to_remote)?;

        if let Some(usage) = &response.usage {
            self.prompt_tokens.fetch_add(usage.prompt_tokens, Ordering::Relaxed);
            self.completion_tokens
                .fetch_add(usage.completion_tokens, Ordering::Relaxed);
        }
        Ok(response)
    }

    async fn complete_stream(&self, request: ChatRequest) -> Result<ChunkStream, PageGenError> {
        let request = self.prepare(request, true);
        let stream: Pin<Box<dyn Stream<Item = Result<ChatChunk, OpenAIError>> + Send>> = self
            .client
            .chat()
            .create_stream_byot(request)
            .await
            .map_err(to_remote)?;
        Ok(Box::pin(stream.map(|chunk| chunk.map_err(to_remote))))
    }
}
