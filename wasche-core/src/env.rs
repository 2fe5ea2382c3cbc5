//! 核心 `write_buf` 导入的输出目标

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

pub const STDOUT_FD: i32 = 1;
pub const STDERR_FD: i32 = 2;

/// 接收程序输出。fd 只会是 1 或 2，其他值在到达这里之前已被拒绝。
pub trait OutputSink {
    fn write_buf(&mut self, fd: i32, buf: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 进程真实的 stdout / stderr
#[derive(Debug, Default)]
pub struct ProcessOutput;

impl OutputSink for ProcessOutput {
    fn write_buf(&mut self, fd: i32, buf: &[u8]) -> io::Result<()> {
        if fd == STDERR_FD {
            io::stderr().write_all(buf)
        } else {
            io::stdout().write_all(buf)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        io::stderr().flush()
    }
}

/// 丢弃所有输出
#[derive(Debug, Default)]
pub struct NullOutput;

impl OutputSink for NullOutput {
    fn write_buf(&mut self, _fd: i32, _buf: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// 捕获输出到内存；克隆出的句柄共享同一缓冲区
#[derive(Clone, Debug, Default)]
pub struct CapturedOutput {
    inner: Arc<Mutex<Captured>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Captured) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn stdout(&self) -> Vec<u8> {
        self.with(|c| c.stdout.clone())
    }

    pub fn stderr(&self) -> Vec<u8> {
        self.with(|c| c.stderr.clone())
    }

    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout()).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr()).into_owned()
    }

    /// 取走并清空已捕获的 stdout
    pub fn take_stdout(&self) -> Vec<u8> {
        self.with(|c| std::mem::take(&mut c.stdout))
    }
}

impl OutputSink for CapturedOutput {
    fn write_buf(&mut self, fd: i32, buf: &[u8]) -> io::Result<()> {
        self.with(|c| {
            if fd == STDERR_FD {
                c.stderr.extend_from_slice(buf);
            } else {
                c.stdout.extend_from_slice(buf);
            }
        });
        Ok(())
    }
}
