//! 核心层：错误类型与网络客户端作用域

pub mod client;
pub mod error;

pub use client::{ClientGuard, ClientSlot};
pub use error::PageGenError;
