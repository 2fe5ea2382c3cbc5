//! API 错误类型
//!
//! 访客运行时错误不在这里：它们由会话按 `exit_on_exception` 处理掉。
//! [`ApiError`] 只承载宿主故障，CLI 据此打印 `error[<phase>]` 并退出。

use std::path::PathBuf;
use thiserror::Error;
use wasche_core::CoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// 会话跟踪目录无法创建或写入
    #[error("session trace: {0}")]
    Trace(#[from] wasche_log::Error),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid config: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{extra_links} link event(s) observed after {warmup} warm-up calls; the JIT recompiled during measurement")]
    RelinkDuringMeasurement { warmup: usize, extra_links: u64 },

    #[error("`{entry}` raised a guest exception on call #{iteration}")]
    GuestTrapDuringBenchmark { entry: String, iteration: usize },

    #[error("fixture path is not valid UTF-8: {}", path.display())]
    FixtureName { path: PathBuf },
}

impl ApiError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ApiError::Io {
            path: path.into(),
            source,
        }
    }

    /// 获取错误阶段名称
    pub fn phase(&self) -> &'static str {
        match self {
            ApiError::Core(e) => e.phase(),
            ApiError::Trace(_) => "trace",
            ApiError::Io { .. } => "io",
            ApiError::Config { .. } => "config",
            ApiError::RelinkDuringMeasurement { .. } | ApiError::GuestTrapDuringBenchmark { .. } => {
                "bench"
            }
            ApiError::FixtureName { .. } => "snapshot",
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
