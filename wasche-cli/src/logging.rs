//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分子系统日志控制。库 crate 写入显式传递的
//! `wasche_log::Logger`，这里用 [`TracingSink`] 把记录转成 `tracing` 事件，
//! 所以一个过滤器控制宿主打印的全部日志。
//!
//! 日志一律写 stderr：stdout 属于访客程序。

use crate::config::{record_level, tracing_level, LogConfig};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer,
};
use wasche_config::Phase;
use wasche_log::{Level, LogSink, Logger, Record};

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

fn level_filter(level: wasche_config::LogLevel) -> LevelFilter {
    tracing_level(level).map_or(LevelFilter::OFF, LevelFilter::from_level)
}

/// 使用指定格式和日志配置初始化日志系统
pub fn init(log_config: &LogConfig, format: LogFormat) {
    let targets = Targets::new()
        .with_default(level_filter(log_config.global))
        .with_target(Phase::Core.target(), level_filter(log_config.level_for(Phase::Core.target())))
        .with_target(
            Phase::Linker.target(),
            level_filter(log_config.level_for(Phase::Linker.target())),
        )
        .with_target(
            Phase::Session.target(),
            level_filter(log_config.level_for(Phase::Session.target())),
        );

    let layer = create_format_layer(format).with_filter(targets);
    // 重复初始化（例如测试里）不是错误
    let _ = tracing_subscriber::registry().with(layer).try_init();
}

/// Create formatter layer based on format
fn create_format_layer(format: LogFormat) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync> {
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(io::stderr)
            .boxed(),
    }
}

/// 显式 logger：级别取各子系统中最详细的一个，由 `tracing` 过滤器做最终裁决
pub fn logger(log_config: &LogConfig) -> Arc<Logger> {
    match record_level(log_config.most_verbose()) {
        Some(level) => Logger::new(level).with_sink(TracingSink),
        None => Logger::noop(),
    }
}

/// 把 `wasche_log` 记录转发为 `tracing` 事件
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

// tracing 的 target 和级别必须是常量
macro_rules! forward {
    ($target:expr, $record:expr) => {
        match $record.level {
            Level::Trace => tracing::trace!(target: $target, "{}", $record.message),
            Level::Debug => tracing::debug!(target: $target, "{}", $record.message),
            Level::Info => tracing::info!(target: $target, "{}", $record.message),
            Level::Warn => tracing::warn!(target: $target, "{}", $record.message),
            Level::Error => tracing::error!(target: $target, "{}", $record.message),
        }
    };
}

const CORE: &str = Phase::Core.target();
const LINKER: &str = Phase::Linker.target();
const SESSION: &str = Phase::Session.target();

impl LogSink for TracingSink {
    fn write(&self, record: &Record) {
        match record.target {
            CORE => forward!(CORE, record),
            LINKER => forward!(LINKER, record),
            SESSION => forward!(SESSION, record),
            _ => forward!("wasche", record),
        }
    }
}
