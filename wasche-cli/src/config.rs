//! CLI 配置
//!
//! 日志级别：全局级别由 `-v` 次数或 `--log-level` 决定，
//! 每个子系统可以用 `--log <target>=<level>` 单独覆盖。

use wasche_config::{LogLevel, Phase};

/// CLI 日志配置
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub global: LogLevel,
    pub core: Option<LogLevel>,
    pub linker: Option<LogLevel>,
    pub session: Option<LogLevel>,
}

impl LogConfig {
    /// `-v` 次数：0 → warn，1 → info，2 → debug，3+ → trace
    pub fn from_verbosity(verbose: u8) -> Self {
        let global = match verbose {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };
        LogConfig {
            global,
            ..LogConfig::default()
        }
    }

    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> LogLevel {
        let specific = match target {
            t if t == Phase::Core.target() => self.core,
            t if t == Phase::Linker.target() => self.linker,
            t if t == Phase::Session.target() => self.session,
            _ => None,
        };
        specific.unwrap_or(self.global)
    }

    /// 最详细的有效级别，决定显式 logger 的过滤下限
    pub fn most_verbose(&self) -> LogLevel {
        [self.core, self.linker, self.session]
            .into_iter()
            .flatten()
            .fold(self.global, LogLevel::max)
    }

    /// 解析 `<target>=<level>`，target 可以写 `core` 或 `wasche::core`
    pub fn apply_override(&mut self, directive: &str) -> Result<(), String> {
        let (target, level) = directive
            .split_once('=')
            .ok_or_else(|| format!("expected <target>=<level>, got `{directive}`"))?;
        let level = LogLevel::parse(level).ok_or_else(|| format!("unknown log level `{level}`"))?;
        let slot = match target.trim_start_matches("wasche::") {
            "core" => &mut self.core,
            "linker" => &mut self.linker,
            "session" => &mut self.session,
            other => return Err(format!("unknown log target `{other}`")),
        };
        *slot = Some(level);
        Ok(())
    }
}

pub fn tracing_level(level: LogLevel) -> Option<tracing::Level> {
    match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(tracing::Level::ERROR),
        LogLevel::Warn => Some(tracing::Level::WARN),
        LogLevel::Info => Some(tracing::Level::INFO),
        LogLevel::Debug => Some(tracing::Level::DEBUG),
        LogLevel::Trace => Some(tracing::Level::TRACE),
    }
}

pub fn record_level(level: LogLevel) -> Option<wasche_log::Level> {
    match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(wasche_log::Level::Error),
        LogLevel::Warn => Some(wasche_log::Level::Warn),
        LogLevel::Info => Some(wasche_log::Level::Info),
        LogLevel::Debug => Some(wasche_log::Level::Debug),
        LogLevel::Trace => Some(wasche_log::Level::Trace),
    }
}
