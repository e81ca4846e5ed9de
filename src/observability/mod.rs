//! 可观测性：tracing 订阅器初始化
//!
//! 默认级别 info，可通过 RUST_LOG 覆盖（如 `RUST_LOG=apply_agent=debug`）。

use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

pub fn init() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    // 重复初始化（如测试中）时忽略错误
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
