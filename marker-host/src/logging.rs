//! # Logging 模块
//!
//! `tracing-subscriber` 初始化。过滤字符串优先取 `RUST_LOG` 环境变量，
//! 否则使用配置中的 `log_filter`。

use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 可重复调用；返回本次调用是否真正完成了安装。
pub fn init_logging(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
