//! wasche-log - 结构化日志与会话跟踪
//!
//! 宿主没有全局日志器：`Arc<Logger>` 随 `RunConfig` 显式传入，
//! 记录扇出到任意 [`LogSink`]（stderr、文件、[`LogRingBuffer`]，CLI 里
//! 还有转发到 tracing 的 sink）。级别宏只在级别启用时格式化消息。
//!
//! [`SessionLog`] 统计链接事件，并可选地把每个链接模块的字节、IR 文本
//! 和核心日志写入跟踪目录，便于离线重放。
//!
//! # 快速开始
//!
//! ```
//! use wasche_log::{LogConfig, Level, debug};
//!
//! let (logger, ring) = LogConfig::new(Level::Debug).with_ring_buffer(100).init();
//! debug!(logger, target: "wasche::session", "session started");
//! assert_eq!(ring.unwrap().len(), 1);
//! ```
//!
//! 跟踪目录布局见 [`TraceDir`]。

mod config;
mod logger;
mod macros;
mod record;
mod ring_buffer;
mod session;
mod trace;

pub use config::{LogConfig, OutputConfig};
pub use logger::{FileSink, LogSink, Logger, StderrSink};
pub use record::{Level, Record};
pub use ring_buffer::LogRingBuffer;
pub use session::{LinkCounter, SessionLog};
pub use trace::TraceDir;

// 宏通过 #[macro_export] 自动导出到 crate 根：
// trace!, debug!, info!, warn!, error!, log!

use std::path::PathBuf;

pub(crate) fn unix_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// 日志结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// 日志系统错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 无法创建跟踪目录（已存在的目录不算错误）
    #[error("cannot create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 跟踪文件写入失败
    #[error("cannot write trace file {}: {source}", path.display())]
    TraceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
