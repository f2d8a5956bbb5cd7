//! 流水线阶段与单阶段请求

use std::fmt;

use crate::llm::ChatMessage;

/// 五个阶段，严格按声明顺序推进；Regeneration 仅在校验未通过时执行一次
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Title,
    ImageSearch,
    HtmlGeneration,
    Validation,
    Regeneration,
}

impl Stage {
    /// 生成类阶段用高温度，检索与校验用低温度
    pub fn temperature(self) -> f32 {
        match self {
            Stage::Title | Stage::HtmlGeneration | Stage::Regeneration => 2.0,
            Stage::ImageSearch | Stage::Validation => 0.1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Title => "title",
            Stage::ImageSearch => "image_search",
            Stage::HtmlGeneration => "html_generation",
            Stage::Validation => "validation",
            Stage::Regeneration => "regeneration",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 发给 Agent 的一条用户消息与温度，仅在构造它的那次调用中存在
#[derive(Clone, Debug)]
pub struct StageMessage {
    pub stage: Stage,
    pub message: ChatMessage,
    pub temperature: f32,
}

impl StageMessage {
    pub fn new(stage: Stage, content: impl Into<String>) -> Self {
        Self {
            stage,
            message: ChatMessage::user(content),
            temperature: stage.temperature(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        std::slice::from_ref(&self.message)
    }
}
