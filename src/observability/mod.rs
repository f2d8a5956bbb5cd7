//! 可观测性：tracing 日志初始化
//!
//! 日志写到 stderr，stdout 只输出页面生成片段，便于重定向。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 默认 info，可通过 RUST_LOG 覆盖；debug 为 true 时默认级别提升到 debug
pub fn init(debug: bool) {
    let default_level = if debug { "pagegen=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
