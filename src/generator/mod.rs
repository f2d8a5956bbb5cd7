//! 页面生成：阶段定义、提示词、产物与流水线

pub mod page;
pub mod pipeline;
pub mod prompts;
pub mod stage;

pub use page::PageArtifact;
pub use pipeline::{PageGenerator, STAGE_SEPARATOR};
pub use stage::{Stage, StageMessage};
