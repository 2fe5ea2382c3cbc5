//! Wasche API - 会话编排层
//!
//! 提供：
//! - [`Session`]：执行入口与访客/宿主错误桥
//! - [`RunConfig`]：显式传递的会话配置
//! - [`snapshot`]：端到端快照驱动
//! - [`bench`]：JIT 预热稳定性探针
//!
//! 库使用方优先使用 [`Session`]；一次性执行用 [`run_script`]。

pub mod bench;
pub mod config;
pub mod env;
pub mod error;
pub mod session;
pub mod snapshot;

pub use bench::{WarmupProbe, WarmupReport};
pub use config::{FileConfig, RunConfig, DEFAULT_RUNTIME_NAME};
pub use env::{ExitFn, ExitRecorder, RuntimeEnv};
pub use error::{ApiError, ApiResult};
pub use session::{run_script, Session, GUEST_ERROR_EXIT_CODE};
pub use snapshot::{
    collect_fixtures, run_fixture, run_suite, SnapshotEntry, SnapshotMode, SnapshotOutput,
    SnapshotStatus, SnapshotStore, SnapshotSummary,
};

// Re-export lower layers
pub use wasche_config;
pub use wasche_config::{CompilerConfig, CompilerFlag, LogLevel, SessionOptions};
pub use wasche_core;
pub use wasche_core::{
    compile, AotProgram, CapturedOutput, CoreError, Extern, GuestTrap, Module, Outcome,
    SchemeValue,
};
pub use wasche_log;
