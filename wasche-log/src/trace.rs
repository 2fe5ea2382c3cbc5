//! 会话跟踪目录
//!
//! 每个会话一组文件，共享前缀 `<runtime 名的 basename>-<unix 毫秒>`：
//!
//! | 文件 | 内容 |
//! |------|------|
//! | `<base>.log` | 核心通过 `log` 导入写出的每一行 |
//! | `<base>-<n>.wasm` | 第 n 个链接模块的字节（n 从 0 开始） |
//! | `<base>-<n>.ir` | 第 n 个模块的 IR 文本（核心提供时） |

use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct TraceDir {
    dir: PathBuf,
    base: String,
    log_file: File,
}

impl TraceDir {
    /// 打开（必要时创建）跟踪目录
    pub fn open(dir: impl AsRef<Path>, runtime_name: &str) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        match std::fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(source) => return Err(Error::CreateDir { path: dir, source }),
        }

        let base = format!(
            "{}-{}",
            runtime_basename(runtime_name),
            crate::unix_millis()
        );
        let log_path = dir.join(format!("{base}.log"));
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|source| Error::TraceWrite {
                path: log_path,
                source,
            })?;

        Ok(TraceDir {
            dir,
            base,
            log_file,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 文件名公共前缀
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.base))
    }

    pub fn module_path(&self, seq: u64) -> PathBuf {
        self.dir.join(format!("{}-{seq}.wasm", self.base))
    }

    pub fn ir_path(&self, seq: u64) -> PathBuf {
        self.dir.join(format!("{}-{seq}.ir", self.base))
    }

    /// 保存第 `seq` 个链接模块
    pub fn write_module(&self, seq: u64, bytes: &[u8], ir: Option<&[u8]>) -> Result<()> {
        write_file(self.module_path(seq), bytes)?;
        if let Some(ir) = ir {
            write_file(self.ir_path(seq), ir)?;
        }
        Ok(())
    }

    /// 追加一行核心日志并立即刷新
    pub fn append_line(&mut self, line: &str) -> Result<()> {
        let path = self.log_path();
        self.log_file
            .write_all(line.as_bytes())
            .and_then(|()| self.log_file.write_all(b"\n"))
            .and_then(|()| self.log_file.flush())
            .map_err(|source| Error::TraceWrite { path, source })
    }
}

fn write_file(path: PathBuf, contents: &[u8]) -> Result<()> {
    std::fs::write(&path, contents).map_err(|source| Error::TraceWrite { path, source })
}

fn runtime_basename(runtime_name: &str) -> &str {
    Path::new(runtime_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(runtime_name)
}
