//! 日志器与输出目标

use crate::record::{Level, Record};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// 日志输出目标
pub trait LogSink: Send + Sync {
    fn write(&self, record: &Record);
}

/// 阈值为该值时不启用任何级别
const OFF: u8 = u8::MAX;

/// 显式传递的日志器
///
/// 没有全局实例：会话、链接器、核心回调都从 `RunConfig` 拿到同一个
/// `Arc<Logger>`。sink 只增不减。
pub struct Logger {
    threshold: AtomicU8,
    sinks: Mutex<Vec<Box<dyn LogSink>>>,
}

impl Logger {
    pub fn new(level: Level) -> Arc<Self> {
        Self::with_threshold(level.rank())
    }

    /// 什么都不记录；库和测试的默认值
    pub fn noop() -> Arc<Self> {
        Self::with_threshold(OFF)
    }

    fn with_threshold(threshold: u8) -> Arc<Self> {
        Arc::new(Logger {
            threshold: AtomicU8::new(threshold),
            sinks: Mutex::new(Vec::new()),
        })
    }

    pub fn with_sink<S: LogSink + 'static>(self: Arc<Self>, sink: S) -> Arc<Self> {
        self.add_sink(sink);
        self
    }

    pub fn add_sink<S: LogSink + 'static>(&self, sink: S) {
        self.sinks().push(Box::new(sink));
    }

    /// 最详细的启用级别；关闭时为 `None`
    pub fn level(&self) -> Option<Level> {
        Level::from_rank(self.threshold.load(Ordering::Relaxed))
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level.rank() >= self.threshold.load(Ordering::Relaxed)
    }

    /// 宏的落点
    #[inline(never)]
    pub fn log(&self, level: Level, target: &'static str, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        let record = Record::new(level, target, message);
        for sink in self.sinks().iter() {
            sink.write(&record);
        }
    }

    fn sinks(&self) -> MutexGuard<'_, Vec<Box<dyn LogSink>>> {
        self.sinks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("sinks", &self.sinks().len())
            .finish()
    }
}

/// 写到标准错误；标准输出属于 Scheme 程序
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write(&self, record: &Record) {
        eprintln!("{record}");
    }
}

/// 追加写入文件
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::options().create(true).append(true).open(path)?;
        Ok(FileSink {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn write(&self, record: &Record) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{record}");
        }
    }
}
