//! Mock LLM 后端（用于测试，无需 API）
//!
//! 按顺序回放预先编排的回复：非流式回复是一条 assistant 消息，流式回复是一组 chunk。
//! 记录每次收到的请求，便于断言温度、消息历史与工具声明。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;

use crate::core::PageGenError;
use crate::llm::{
    ChatBackend, ChatChoice, ChatChunk, ChatMessage, ChatRequest, ChatResponse, ChunkStream,
    ToolCall,
};

/// 一次编排好的回复
#[derive(Debug)]
pub enum ScriptedReply {
    Message(ChatMessage),
    Chunks(Vec<ChatChunk>),
    Fail(u16),
}

impl ScriptedReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Message(ChatMessage::assistant(content))
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self::Message(ChatMessage::assistant_tool_calls(None, calls))
    }

    /// 把每个片段作为一个文本增量 chunk
    pub fn fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Chunks(fragments.into_iter().map(ChatChunk::text).collect())
    }
}

/// Mock 后端：回复队列耗尽后返回空 assistant 消息
#[derive(Debug, Default)]
pub struct MockChatBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatBackend {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next_reply(&self, request: ChatRequest) -> ScriptedReply {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::text(""))
    }
}

fn message_to_chunks(message: ChatMessage) -> Vec<ChatChunk> {
    let mut chunks = Vec::new();
    if let Some(content) = message.content.filter(|c| !c.is_empty()) {
        chunks.push(ChatChunk::text(content));
    }
    for (i, call) in message.tool_calls.unwrap_or_default().iter().enumerate() {
        chunks.push(ChatChunk::tool_call(
            i,
            Some(&call.id),
            Some(&call.function.name),
            &call.function.arguments,
        ));
    }
    chunks
}

fn chunks_to_message(chunks: Vec<ChatChunk>) -> ChatMessage {
    let content: String = chunks
        .iter()
        .flat_map(|c| c.choices.iter())
        .filter_map(|c| c.delta.content.as_deref())
        .collect();
    ChatMessage::assistant(content)
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, PageGenError> {
        let message = match self.next_reply(request) {
            ScriptedReply::Message(m) => m,
            ScriptedReply::Chunks(chunks) => chunks_to_message(chunks),
            ScriptedReply::Fail(status) => {
                return Err(PageGenError::remote_status("deepseek", status, "scripted failure"))
            }
        };
        Ok(ChatResponse {
            choices: vec![ChatChoice {
                message,
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        })
    }

    async fn complete_stream(&self, request: ChatRequest) -> Result<ChunkStream, PageGenError> {
        let chunks = match self.next_reply(request) {
            ScriptedReply::Message(m) => message_to_chunks(m),
            ScriptedReply::Chunks(chunks) => chunks,
            ScriptedReply::Fail(status) => {
                return Err(PageGenError::remote_status("deepseek", status, "scripted failure"))
            }
        };
        Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_replays_in_order_and_records_requests() {
        let mock = MockChatBackend::new([
            ScriptedReply::text("first"),
            ScriptedReply::fragments(["a", "b"]),
        ]);

        let resp = mock
            .complete(ChatRequest::new(vec![ChatMessage::user("q1")], 2.0))
            .await
            .unwrap();
        assert_eq!(resp.into_message().content_str(), "first");

        let mut stream = mock
            .complete_stream(ChatRequest::new(vec![ChatMessage::user("q2")], 0.1))
            .await
            .unwrap();
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            text.push_str(chunk.unwrap().choices[0].delta.content.as_deref().unwrap_or(""));
        }
        assert_eq!(text, "ab");

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].temperature, 0.1);
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let mock = MockChatBackend::new([ScriptedReply::Fail(503)]);
        let err = mock
            .complete(ChatRequest::new(vec![], 0.1))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }
}
