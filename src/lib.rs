//! pagegen - 由一句话需求生成完整静态网页（HTML+CSS+JS）
//!
//! 模块划分：
//! - **agent**: 对话 Agent 抽象、线程标识与线程历史、带工具调用的 ReAct 实现
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、网络客户端的 setup/teardown 作用域
//! - **generator**: 五阶段页面生成流水线与产物
//! - **llm**: Chat Completions 线路类型与后端（DeepSeek / Mock）
//! - **observability**: tracing 日志初始化
//! - **tools**: 工具注册表与图片搜索工具
//! - **unsplash**: Unsplash 图片搜索客户端

pub mod agent;
pub mod config;
pub mod core;
pub mod generator;
pub mod llm;
pub mod observability;
pub mod tools;
pub mod unsplash;

pub use agent::{ConversationalAgent, ReactAgent, ThreadId};
pub use core::{ClientGuard, ClientSlot, PageGenError};
pub use generator::{PageArtifact, PageGenerator, Stage};
