//! LLM 层：线路类型、后端抽象与实现（DeepSeek / Mock）

pub mod deepseek;
pub mod mock;
pub mod traits;
pub mod types;

pub use deepseek::{DeepSeekClient, DEEPSEEK_BASE_URL, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use mock::{MockChatBackend, ScriptedReply};
pub use traits::{ChatBackend, ChunkStream};
pub use types::{
    ChatChoice, ChatChunk, ChatMessage, ChatRequest, ChatResponse, FunctionCall, Role, ToolCall,
    ToolCallAccumulator, ToolDefinition, Usage,
};
