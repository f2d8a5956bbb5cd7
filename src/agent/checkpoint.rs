//! 线程级对话历史（仅内存，进程重启即丢失）

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::agent::ThreadId;
use crate::llm::ChatMessage;

/// 以 ThreadId 为键保存完整消息历史；不同线程互不可见。
/// 锁只在读写 map 时短暂持有，不跨 await，因此也可以在 Drop 中释放线程。
#[derive(Debug, Default)]
pub struct Checkpointer {
    threads: Mutex<HashMap<ThreadId, Vec<ChatMessage>>>,
}

impl Checkpointer {
    pub fn new() -> Self {
        Self::default()
    }

    fn threads(&self) -> MutexGuard<'_, HashMap<ThreadId, Vec<ChatMessage>>> {
        self.threads.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 线程历史的副本；未知线程返回空
    pub fn load(&self, thread: &ThreadId) -> Vec<ChatMessage> {
        self.threads().get(thread).cloned().unwrap_or_default()
    }

    pub fn save(&self, thread: &ThreadId, messages: Vec<ChatMessage>) {
        self.threads().insert(thread.clone(), messages);
    }

    pub fn remove(&self, thread: &ThreadId) -> Option<Vec<ChatMessage>> {
        self.threads().remove(thread)
    }

    pub fn thread_count(&self) -> usize {
        self.threads().len()
    }
}
