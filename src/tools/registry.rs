//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / 输入输出 schema / execute），由 ToolRegistry 按名注册与查找，
//! 并导出为 Chat Completions 的函数工具声明。

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::PageGenError;
use crate::llm::ToolDefinition;

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、返回值 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（函数调用中的 name）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 返回值 JSON Schema（仅用于文档与声明，API 不消费）
    fn output_schema(&self) -> Value {
        serde_json::json!({})
    }

    /// 参数无法解析时返回 Ok(Err(说明))，由调用方回传给模型；执行失败返回外层 Err，原样传播
    async fn execute(&self, args: Value) -> Result<Result<Value, String>, PageGenError>;
}

/// 工具注册表：按名称有序存储 Arc<dyn Tool>，声明顺序稳定
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// 函数工具声明列表，随每次 chat 请求下发
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| {
                ToolDefinition::function(tool.name(), tool.description(), tool.parameters_schema())
            })
            .collect()
    }

    /// 执行工具并输出审计日志；返回给模型的内容为 JSON 文本
    ///
    /// 未知工具与参数错误以文本形式回传给模型；工具执行失败（如上游 HTTP 错误）原样返回 Err
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<String, PageGenError> {
        let start = Instant::now();
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = %name, "model called unknown tool");
            return Ok(format!("Error: unknown tool '{name}'. Available: {}", self.tool_names().join(", ")));
        };

        let args: Value = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str(arguments) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(tool = %name, error = %e, "invalid tool arguments");
                    return Ok(format!("Error: arguments are not valid JSON: {e}"));
                }
            }
        };

        let result = tool.execute(args).await;
        let outcome = match &result {
            Ok(Ok(_)) => "ok",
            Ok(Err(_)) => "invalid_args",
            Err(_) => "error",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": name,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview(arguments),
        });
        tracing::info!(audit = %audit, "tool");

        match result? {
            Ok(value) => Ok(value.to_string()),
            Err(reason) => Ok(format!("Error: {reason}")),
        }
    }
}

fn args_preview(args: &str) -> String {
    if args.chars().count() > 200 {
        format!("{}...", args.chars().take(200).collect::<String>())
    } else {
        args.to_string()
    }
}
