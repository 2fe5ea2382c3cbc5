//! API 层配置
//!
//! [`RunConfig`] 汇总一次会话需要的全部外部输入；[`FileConfig`] 是
//! `--config` 指向的 JSON 文件结构。

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wasche_config::{CompilerConfig, SessionOptions};
use wasche_log::{Logger, SessionLog};

/// 未指定时的运行时名（跟踪文件名前缀）
pub const DEFAULT_RUNTIME_NAME: &str = "wasche";

/// Execution configuration
#[derive(Clone)]
pub struct RunConfig {
    /// 编译开关，`init` 之前应用
    pub compiler: CompilerConfig,
    pub session: SessionOptions,
    /// 会话跟踪目录，`None` 时不落盘
    pub log_dir: Option<PathBuf>,
    /// 跟踪文件名前缀取它的 basename
    pub runtime_name: String,
    pub logger: Arc<Logger>,
}

impl RunConfig {
    pub fn with_compiler(mut self, compiler: CompilerConfig) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_session(mut self, session: SessionOptions) -> Self {
        self.session = session;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_runtime_name(mut self, name: impl Into<String>) -> Self {
        self.runtime_name = name.into();
        self
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// 为新会话打开跟踪；每个会话各自一组文件
    pub fn session_log(&self) -> ApiResult<SessionLog> {
        Ok(SessionLog::open(
            self.logger.clone(),
            self.log_dir.as_deref(),
            &self.runtime_name,
        )?)
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("compiler", &self.compiler)
            .field("session", &self.session)
            .field("log_dir", &self.log_dir)
            .field("runtime_name", &self.runtime_name)
            .finish()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            compiler: CompilerConfig::default(),
            session: SessionOptions::default(),
            log_dir: None,
            runtime_name: DEFAULT_RUNTIME_NAME.to_string(),
            logger: Logger::noop(),
        }
    }
}

/// `--config` 文件
///
/// ```json
/// { "compiler": { "enableJit": false }, "session": { "echoResults": true } }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct FileConfig {
    pub compiler: CompilerConfig,
    pub session: SessionOptions,
}

impl FileConfig {
    pub fn from_json(path: &Path, text: &str) -> ApiResult<Self> {
        serde_json::from_str(text).map_err(|e| ApiError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> ApiResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ApiError::io(path, e))?;
        Self::from_json(path, &text)
    }

    /// 覆盖 `config` 的编译开关和会话选项
    pub fn apply(self, config: RunConfig) -> RunConfig {
        config.with_compiler(self.compiler).with_session(self.session)
    }
}
