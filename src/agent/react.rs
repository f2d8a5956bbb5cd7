//! ReAct Agent：带工具调用的 chat 循环
//!
//! 读取线程历史 -> 追加本轮消息 -> 携带工具声明请求模型 -> 若返回 tool_calls 则执行并写回 tool 消息，再次请求；
//! 直到模型给出不含工具调用的回复，写入历史并返回。工具轮数超过上限报 ToolLoopExceeded。
//! 流式版本只转发文本增量，tool_call 增量按 index 拼接；流被 drop 时在途请求随之取消，历史不写回。

use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};

use crate::agent::{Checkpointer, ConversationalAgent, FragmentStream, ThreadId};
use crate::core::{ClientSlot, PageGenError};
use crate::llm::{ChatBackend, ChatMessage, ChatRequest, ToolCall, ToolCallAccumulator};
use crate::tools::ToolRegistry;

/// 默认单阶段最多工具轮数
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// 插槽名（用于 ClientNotInitialized 报错）
pub const LLM_SLOT: &str = "deepseek";

#[derive(Clone)]
pub struct ReactAgent {
    backend: ClientSlot<dyn ChatBackend>,
    tools: Arc<ToolRegistry>,
    checkpointer: Arc<Checkpointer>,
    max_tool_rounds: usize,
    debug: bool,
}

impl ReactAgent {
    pub fn new(backend: ClientSlot<dyn ChatBackend>, tools: ToolRegistry) -> Self {
        Self {
            backend,
            tools: Arc::new(tools),
            checkpointer: Arc::new(Checkpointer::new()),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            debug: false,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// 以 debug 级别记录每轮请求的消息数与工具调用
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn checkpointer(&self) -> &Arc<Checkpointer> {
        &self.checkpointer
    }

    fn request(&self, history: &[ChatMessage], temperature: f32) -> ChatRequest {
        ChatRequest::new(history.to_vec(), temperature).with_tools(self.tools.definitions())
    }

    fn trace_round(&self, thread: &ThreadId, round: usize, history: &[ChatMessage]) {
        if self.debug {
            tracing::debug!(thread_id = %thread, round, messages = history.len(), "agent request");
        }
    }

    async fn run_tools(
        &self,
        thread: &ThreadId,
        calls: &[ToolCall],
        history: &mut Vec<ChatMessage>,
    ) -> Result<(), PageGenError> {
        for call in calls {
            tracing::info!(thread_id = %thread, tool = %call.function.name, "agent tool call");
            let output = self
                .tools
                .execute(&call.function.name, &call.function.arguments)
                .await?;
            history.push(ChatMessage::tool(call.id.as_str(), output));
        }
        Ok(())
    }

    fn fragments(
        self,
        backend: Arc<dyn ChatBackend>,
        thread: ThreadId,
        mut history: Vec<ChatMessage>,
        temperature: f32,
    ) -> impl Stream<Item = Result<String, PageGenError>> + Send {
        try_stream! {
            let mut round = 0;
            loop {
                self.trace_round(&thread, round, &history);
                let mut chunks = backend
                    .complete_stream(self.request(&history, temperature).with_stream())
                    .await?;

                let mut content = String::new();
                let mut pending = ToolCallAccumulator::default();
                while let Some(chunk) = chunks.next().await {
                    for choice in chunk?.choices {
                        for delta in choice.delta.tool_calls.iter().flatten() {
                            pending.push(delta);
                        }
                        if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                            content.push_str(&text);
                            yield text;
                        }
                    }
                }

                let calls = pending.finish();
                if calls.is_empty() {
                    history.push(ChatMessage::assistant(content));
                    break;
                }
                if round >= self.max_tool_rounds {
                    Err::<(), _>(PageGenError::ToolLoopExceeded(self.max_tool_rounds))?;
                }
                let content = Some(content).filter(|c| !c.is_empty());
                history.push(ChatMessage::assistant_tool_calls(content, calls.clone()));
                self.run_tools(&thread, &calls, &mut history).await?;
                round += 1;
            }
            self.checkpointer.save(&thread, history);
        }
    }
}

#[async_trait]
impl ConversationalAgent for ReactAgent {
    async fn invoke(
        &self,
        thread: &ThreadId,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, PageGenError> {
        let backend = self.backend.get()?;
        let mut history = self.checkpointer.load(thread);
        history.extend_from_slice(messages);

        let mut round = 0;
        loop {
            self.trace_round(thread, round, &history);
            let reply = backend
                .complete(self.request(&history, temperature))
                .await?
                .into_message();

            let calls = reply.tool_calls.clone().unwrap_or_default();
            if calls.is_empty() {
                let content = reply.content_str().to_string();
                history.push(reply);
                self.checkpointer.save(thread, history);
                return Ok(content);
            }
            if round >= self.max_tool_rounds {
                return Err(PageGenError::ToolLoopExceeded(self.max_tool_rounds));
            }
            history.push(reply);
            self.run_tools(thread, &calls, &mut history).await?;
            round += 1;
        }
    }

    async fn stream(
        &self,
        thread: &ThreadId,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<FragmentStream, PageGenError> {
        let backend = self.backend.get()?;
        let mut history = self.checkpointer.load(thread);
        history.extend_from_slice(messages);
        Ok(Box::pin(self.clone().fragments(
            backend,
            thread.clone(),
            history,
            temperature,
        )))
    }

    fn release(&self, thread: &ThreadId) {
        if let Some(history) = self.checkpointer.remove(thread) {
            tracing::debug!(thread_id = %thread, messages = history.len(), "thread released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatChunk, MockChatBackend, Role, ScriptedReply, ToolDefinition};
    use crate::tools::Tool;
    use serde_json::Value;

    struct Keywords;

    #[async_trait]
    impl Tool for Keywords {
        fn name(&self) -> &str {
            "get_images_from_unsplash"
        }

        fn description(&self) -> &str {
            "fake image search"
        }

        async fn execute(&self, args: Value) -> Result<Result<Value, String>, PageGenError> {
            let first = args["topic_keywords"][0].as_str().unwrap_or("none").to_string();
            if first == "fail" {
                return Err(PageGenError::remote_status("unsplash", 500, "boom"));
            }
            Ok(Ok(serde_json::json!([format!("https://img/{first}")])))
        }
    }

    fn agent_with(mock: Arc<MockChatBackend>) -> (ReactAgent, crate::core::ClientGuard<dyn ChatBackend>) {
        let slot: ClientSlot<dyn ChatBackend> = ClientSlot::new(LLM_SLOT);
        let guard = slot.setup(mock);
        let mut tools = ToolRegistry::new();
        tools.register(Keywords);
        (ReactAgent::new(slot, tools), guard)
    }

    fn search_call(keyword: &str) -> ToolCall {
        ToolCall::function(
            "call_1",
            "get_images_from_unsplash",
            format!(r#"{{"topic_keywords":["{keyword}"]}}"#),
        )
    }

    async fn collect(mut stream: FragmentStream) -> Result<Vec<String>, PageGenError> {
        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            out.push(item?);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn test_invoke_plain_reply_is_saved_to_thread() {
        let mock = Arc::new(MockChatBackend::new([ScriptedReply::text("Кофейня Утро")]));
        let (agent, _guard) = agent_with(mock.clone());
        let thread = ThreadId::new();

        let reply = agent
            .invoke(&thread, &[ChatMessage::user("title please")], 2.0)
            .await
            .unwrap();
        assert_eq!(reply, "Кофейня Утро");

        let history = agent.checkpointer().load(&thread);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Assistant);

        let requests = mock.requests();
        assert_eq!(requests[0].temperature, 2.0);
        let declared: Vec<&ToolDefinition> = requests[0].tools.iter().collect();
        assert_eq!(declared[0].function.name, "get_images_from_unsplash");
    }

    #[tokio::test]
    async fn test_invoke_runs_tool_then_answers() {
        let mock = Arc::new(MockChatBackend::new([
            ScriptedReply::tool_calls(vec![search_call("coffee")]),
            ScriptedReply::text("done"),
        ]));
        let (agent, _guard) = agent_with(mock.clone());
        let thread = ThreadId::new();

        let reply = agent.invoke(&thread, &[ChatMessage::user("find")], 0.1).await.unwrap();
        assert_eq!(reply, "done");

        let second = &mock.requests()[1];
        let tool_msg = second.messages.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_msg.content_str(), r#"["https://img/coffee"]"#);
    }

    #[tokio::test]
    async fn test_second_call_sees_thread_history() {
        let mock = Arc::new(MockChatBackend::new([
            ScriptedReply::text("one"),
            ScriptedReply::text("two"),
        ]));
        let (agent, _guard) = agent_with(mock.clone());
        let thread = ThreadId::new();

        agent.invoke(&thread, &[ChatMessage::user("q1")], 2.0).await.unwrap();
        agent.invoke(&thread, &[ChatMessage::user("q2")], 2.0).await.unwrap();

        let contents: Vec<String> = mock.requests()[1]
            .messages
            .iter()
            .map(|m| m.content_str().to_string())
            .collect();
        assert_eq!(contents, vec!["q1", "one", "q2"]);

        agent.invoke(&ThreadId::new(), &[ChatMessage::user("other")], 2.0).await.unwrap();
        assert_eq!(mock.requests()[2].messages.len(), 1);
    }

    #[tokio::test]
    async fn test_release_drops_thread_history() {
        let mock = Arc::new(MockChatBackend::new([ScriptedReply::text("one")]));
        let (agent, _guard) = agent_with(mock);
        let thread = ThreadId::new();

        agent.invoke(&thread, &[ChatMessage::user("q1")], 2.0).await.unwrap();
        assert_eq!(agent.checkpointer().thread_count(), 1);

        agent.release(&thread);
        assert_eq!(agent.checkpointer().thread_count(), 0);
        agent.release(&thread);
    }

    #[tokio::test]
    async fn test_tool_loop_limit() {
        let mock = Arc::new(MockChatBackend::new([
            ScriptedReply::tool_calls(vec![search_call("a")]),
            ScriptedReply::tool_calls(vec![search_call("b")]),
        ]));
        let (agent, _guard) = agent_with(mock);
        let agent = agent.with_max_tool_rounds(1);

        let err = agent
            .invoke(&ThreadId::new(), &[ChatMessage::user("loop")], 0.1)
            .await
            .unwrap_err();
        assert!(matches!(err, PageGenError::ToolLoopExceeded(1)));
    }

    #[tokio::test]
    async fn test_stream_forwards_text_and_resolves_tool_calls() {
        let mock = Arc::new(MockChatBackend::new([
            ScriptedReply::Chunks(vec![
                ChatChunk::text("Ищу "),
                ChatChunk::tool_call(0, Some("call_9"), Some("get_images_from_unsplash"), r#"{"topic_"#),
                ChatChunk::tool_call(0, None, None, r#"keywords":["tea"]}"#),
            ]),
            ScriptedReply::fragments(["картинки ", "найдены"]),
        ]));
        let (agent, _guard) = agent_with(mock.clone());
        let thread = ThreadId::new();

        let stream = agent
            .stream(&thread, &[ChatMessage::user("find")], 0.1)
            .await
            .unwrap();
        let fragments = collect(stream).await.unwrap();
        assert_eq!(fragments, vec!["Ищу ", "картинки ", "найдены"]);

        let history = agent.checkpointer().load(&thread);
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(history[2].content_str(), r#"["https://img/tea"]"#);
        assert_eq!(history[3].content_str(), "картинки найдены");
        assert!(mock.requests().iter().all(|r| r.stream));
    }

    #[tokio::test]
    async fn test_stream_tool_failure_propagates() {
        let mock = Arc::new(MockChatBackend::new([ScriptedReply::tool_calls(vec![search_call("fail")])]));
        let (agent, _guard) = agent_with(mock);
        let thread = ThreadId::new();

        let stream = agent
            .stream(&thread, &[ChatMessage::user("find")], 0.1)
            .await
            .unwrap();
        let err = collect(stream).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(agent.checkpointer().load(&thread).is_empty());
    }

    #[tokio::test]
    async fn test_requires_backend_setup() {
        let slot: ClientSlot<dyn ChatBackend> = ClientSlot::new(LLM_SLOT);
        let agent = ReactAgent::new(slot, ToolRegistry::new());
        let err = agent
            .invoke(&ThreadId::new(), &[ChatMessage::user("x")], 2.0)
            .await
            .unwrap_err();
        assert!(matches!(err, PageGenError::ClientNotInitialized("deepseek")));
        assert!(agent
            .stream(&ThreadId::new(), &[ChatMessage::user("x")], 2.0)
            .await
            .is_err());
    }
}
