//! 会话日志：链接事件计数、核心日志行、可选的跟踪目录

use crate::{Logger, Result, TraceDir};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const CORE_TARGET: &str = "wasche::core";
const LINKER_TARGET: &str = "wasche::linker";

/// 已观察到的链接事件数，可在会话之外共享读取
#[derive(Clone, Debug, Default)]
pub struct LinkCounter(Arc<AtomicU64>);

impl LinkCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// 记一次链接事件，返回它的序号（从 0 开始）
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// 一个会话的持久化/日志协作者
///
/// 关闭跟踪目录只影响落盘，不影响计数和日志，也不影响任何执行结果。
pub struct SessionLog {
    logger: Arc<Logger>,
    trace: Option<TraceDir>,
    links: LinkCounter,
}

impl SessionLog {
    pub fn new(logger: Arc<Logger>) -> Self {
        SessionLog {
            logger,
            trace: None,
            links: LinkCounter::new(),
        }
    }

    /// `log_dir` 为 `None` 时不落盘
    pub fn open(logger: Arc<Logger>, log_dir: Option<&Path>, runtime_name: &str) -> Result<Self> {
        let mut log = SessionLog::new(logger);
        if let Some(dir) = log_dir {
            let trace = TraceDir::open(dir, runtime_name)?;
            crate::debug!(log.logger, target: LINKER_TARGET, "tracing session to {}/{}", dir.display(), trace.base());
            log.trace = Some(trace);
        }
        Ok(log)
    }

    pub fn with_trace(mut self, trace: TraceDir) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn trace_dir(&self) -> Option<&TraceDir> {
        self.trace.as_ref()
    }

    pub fn links(&self) -> LinkCounter {
        self.links.clone()
    }

    /// 记录一次链接事件，返回序号
    pub fn instantiate(&mut self, bytes: &[u8], ir: Option<&[u8]>) -> Result<u64> {
        let seq = self.links.bump();
        crate::trace!(
            self.logger,
            target: LINKER_TARGET,
            "module #{seq}: {} bytes, ir: {}",
            bytes.len(),
            ir.map_or(0, <[u8]>::len)
        );
        if let Some(trace) = &self.trace {
            trace.write_module(seq, bytes, ir)?;
        }
        Ok(seq)
    }

    /// 核心写出的一行日志
    pub fn core_line(&mut self, line: &str) -> Result<()> {
        crate::debug!(self.logger, target: CORE_TARGET, "{line}");
        if let Some(trace) = &mut self.trace {
            trace.append_line(line)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLog")
            .field("trace", &self.trace.as_ref().map(TraceDir::base))
            .field("links", &self.links.get())
            .finish()
    }
}
