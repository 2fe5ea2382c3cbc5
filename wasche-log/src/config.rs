//! 日志器装配
//!
//! 没有 stdout 输出：宿主的标准输出属于 Scheme 程序。

use crate::logger::{FileSink, StderrSink};
use crate::{Level, LogRingBuffer, Logger};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum OutputConfig {
    Stderr,
    /// 追加写入
    File(PathBuf),
    /// 最近 N 条
    RingBuffer(usize),
}

/// 日志器构建参数
///
/// ```
/// use wasche_log::{debug, Level, LogConfig};
///
/// let (logger, ring) = LogConfig::new(Level::Debug).with_ring_buffer(16).init();
/// debug!(logger, target: "wasche::linker", "module #0 linked");
/// assert_eq!(ring.unwrap().messages_for("wasche::linker").len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// `None` 表示全部关闭
    pub level: Option<Level>,
    pub outputs: Vec<OutputConfig>,
}

impl LogConfig {
    pub fn new(level: Level) -> Self {
        LogConfig {
            level: Some(level),
            outputs: Vec::new(),
        }
    }

    /// 本地调试：Debug 级别写 stderr，同时保留最近 4096 条
    pub fn dev() -> Self {
        LogConfig::new(Level::Debug)
            .with_stderr()
            .with_ring_buffer(4096)
    }

    /// 静默
    pub fn test() -> Self {
        LogConfig {
            level: None,
            outputs: Vec::new(),
        }
    }

    pub fn with_stderr(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Stderr) {
            self.outputs.push(OutputConfig::Stderr);
        }
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(OutputConfig::File(path.into()));
        self
    }

    pub fn with_ring_buffer(mut self, capacity: usize) -> Self {
        self.outputs.push(OutputConfig::RingBuffer(capacity));
        self
    }

    /// 构建日志器，并返回最后一个环形缓冲区（若配置了）
    ///
    /// 打不开的日志文件被跳过，不影响会话。
    pub fn init(self) -> (Arc<Logger>, Option<Arc<LogRingBuffer>>) {
        let logger = match self.level {
            Some(level) => Logger::new(level),
            None => Logger::noop(),
        };
        let mut ring = None;
        for output in self.outputs {
            match output {
                OutputConfig::Stderr => logger.add_sink(StderrSink),
                OutputConfig::File(path) => {
                    if let Ok(sink) = FileSink::new(&path) {
                        logger.add_sink(sink);
                    }
                }
                OutputConfig::RingBuffer(capacity) => {
                    let buffer = LogRingBuffer::new(capacity);
                    logger.add_sink(Arc::clone(&buffer));
                    ring = Some(buffer);
                }
            }
        }
        (logger, ring)
    }
}
