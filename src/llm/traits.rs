//! LLM 后端抽象
//!
//! 所有后端（DeepSeek / Mock）实现 ChatBackend：complete（非流式）、complete_stream（流式 chunk）。
//! 工具声明随请求下发，是否调用工具由模型决定。

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::core::PageGenError;
use crate::llm::{ChatChunk, ChatRequest, ChatResponse};

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, PageGenError>> + Send>>;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// 非流式完成
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, PageGenError>;

    /// 流式完成，返回增量 chunk 流；drop 流即中止请求
    async fn complete_stream(&self, request: ChatRequest) -> Result<ChunkStream, PageGenError>;
}
