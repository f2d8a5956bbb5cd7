//! Agent 层：对话 Agent 抽象、线程标识、线程历史与带工具调用的 ReAct 实现

pub mod checkpoint;
pub mod react;
pub mod thread;
pub mod traits;

pub use checkpoint::Checkpointer;
pub use react::ReactAgent;
pub use thread::ThreadId;
pub use traits::{ConversationalAgent, FragmentStream};
