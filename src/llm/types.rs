//! Chat Completions 线路格式（OpenAI 兼容，DeepSeek 同款）
//!
//! 只保留流水线用到的字段：带 tool_calls 的消息、函数工具声明、非流式响应与流式增量。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// 单条消息；assistant 消息可携带 tool_calls，tool 消息携带 tool_call_id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// assistant 发起工具调用（content 可能为空）
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// 函数调用：arguments 为 JSON 字符串（由模型生成，未必合法）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// 向模型声明的工具
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            kind: function_type(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// 一次 chat/completions 请求；model 为空时由后端填充
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>, temperature: f32) -> Self {
        Self {
            model: String::new(),
            messages,
            temperature,
            tools: Vec::new(),
            stream: false,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_stream(mut self) -> Self {
        self.stream = true;
        self
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// 首个 choice 的消息；没有 choice 时视为空的 assistant 回复
    pub fn into_message(self) -> ChatMessage {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .unwrap_or_else(|| ChatMessage::assistant(""))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// 流式响应中的一个 chunk
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatChunk {
    /// 构造只含文本增量的 chunk（mock 与测试用）
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: Delta {
                    content: Some(content.into()),
                    tool_calls: None,
                },
                finish_reason: None,
            }],
        }
    }

    /// 构造只含一个工具调用增量的 chunk
    pub fn tool_call(index: usize, id: Option<&str>, name: Option<&str>, arguments: &str) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: Delta {
                    content: None,
                    tool_calls: Some(vec![ToolCallDelta {
                        index,
                        id: id.map(String::from),
                        function: Some(FunctionCallDelta {
                            name: name.map(String::from),
                            arguments: Some(arguments.to_string()),
                        }),
                    }]),
                },
                finish_reason: None,
            }],
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionCallDelta>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FunctionCallDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// 按 index 拼接流式 tool_call 增量：id 与 name 取首次出现的值，arguments 逐段追加
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: Vec<ToolCall>,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, delta: &ToolCallDelta) {
        while self.calls.len() <= delta.index {
            self.calls.push(ToolCall::function("", "", ""));
        }
        let call = &mut self.calls[delta.index];
        if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
            if call.id.is_empty() {
                call.id = id.to_string();
            }
        }
        if let Some(function) = &delta.function {
            if let Some(name) = function.name.as_deref().filter(|n| !n.is_empty()) {
                if call.function.name.is_empty() {
                    call.function.name = name.to_string();
                }
            }
            if let Some(arguments) = &function.arguments {
                call.function.arguments.push_str(arguments);
            }
        }
    }

    /// 丢弃没有函数名的残缺条目；缺 id 时按序号补一个
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .enumerate()
            .filter(|(_, c)| !c.function.name.is_empty())
            .map(|(i, mut c)| {
                if c.id.is_empty() {
                    c.id = format!("call_{i}");
                }
                c
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization_skips_empty_tool_fields() {
        let v = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(v, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_tool_message_serialization() {
        let v = serde_json::to_value(ChatMessage::tool("call_1", "[\"u\"]")).unwrap();
        assert_eq!(v["role"], "tool");
        assert_eq!(v["tool_call_id"], "call_1");
    }

    #[test]
    fn test_response_with_tool_calls() {
        let body = json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "get_images_from_unsplash", "arguments": "{\"topic_keywords\":[\"coffee\"]}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });
        let resp: ChatResponse = serde_json::from_value(body).unwrap();
        let msg = resp.into_message();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.is_none());
        let calls = msg.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "get_images_from_unsplash");
    }

    #[test]
    fn test_empty_response_is_empty_assistant() {
        let resp: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(resp.into_message().content_str(), "");
    }

    #[test]
    fn test_request_omits_empty_tools() {
        let req = ChatRequest::new(vec![ChatMessage::user("x")], 0.1);
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("tools").is_none());
        assert_eq!(v["stream"], false);
    }

    #[test]
    fn test_accumulator_joins_fragments() {
        let mut acc = ToolCallAccumulator::default();
        acc.push(&ChatChunk::tool_call(0, Some("call_1"), Some("get_images_from_unsplash"), "{\"topic_")
            .choices[0].delta.tool_calls.as_ref().unwrap()[0]);
        acc.push(&ChatChunk::tool_call(0, None, None, "keywords\":[\"tea\"]}")
            .choices[0].delta.tool_calls.as_ref().unwrap()[0]);
        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.arguments, "{\"topic_keywords\":[\"tea\"]}");
    }

    #[test]
    fn test_accumulator_drops_nameless_entries() {
        let mut acc = ToolCallAccumulator::default();
        acc.push(&ToolCallDelta {
            index: 1,
            id: None,
            function: Some(FunctionCallDelta {
                name: Some("get_images_from_unsplash".into()),
                arguments: Some("{}".into()),
            }),
        });
        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
    }
}
