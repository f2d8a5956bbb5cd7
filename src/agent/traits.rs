//! 对话 Agent 抽象
//!
//! 流水线只依赖此 trait：提交一组角色消息与温度，在给定线程的上下文中得到完整回复或文本片段流。
//! Agent 可在一轮中自主调用已声明的工具；线程内的历史由 Agent 自己保存，调用方无需重复发送。

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::agent::ThreadId;
use crate::core::PageGenError;
use crate::llm::ChatMessage;

/// 惰性、有限、不可重启的文本片段流
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, PageGenError>> + Send>>;

#[async_trait]
pub trait ConversationalAgent: Send + Sync {
    /// 非流式：返回本轮最终 assistant 消息的文本
    async fn invoke(
        &self,
        thread: &ThreadId,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, PageGenError>;

    /// 流式：逐段返回模型生成的文本（工具调用结果不出现在流中）
    async fn stream(
        &self,
        thread: &ThreadId,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<FragmentStream, PageGenError>;

    /// 运行结束后释放线程历史；未知线程忽略
    fn release(&self, _thread: &ThreadId) {}
}
