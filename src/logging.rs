/*
 * @Description  : 日志：安装全局 tracing 订阅器（EnvFilter + fmt）
 *
 * 库代码只发出 tracing 事件，从不自行安装订阅器；由 demo 或测试在入口处调用
 * `init_tracing`。`RUST_LOG` 存在时覆盖默认级别。
 */

use std::io::IsTerminal;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// 安装日志订阅器时的错误
#[derive(Debug, Error)]
pub enum InitError {
    #[error("tracing 订阅器已经初始化过")]
    AlreadyInitialised,
    #[error("无法解析日志过滤指令 {directive:?}: {source}")]
    Filter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("安装全局订阅器失败: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// 安装全局订阅器；`default_level` 如 `"info"`、`"fuzzy_pool=debug"`
pub fn init_tracing(default_level: &str) -> Result<(), InitError> {
    INITIALISED
        .set(())
        .map_err(|_| InitError::AlreadyInitialised)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level).map_err(|source| InitError::Filter {
            directive: default_level.to_string(),
            source,
        })?,
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    Registry::default().with(filter).with(fmt_layer).try_init()?;
    Ok(())
}
