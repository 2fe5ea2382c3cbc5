//! 宿主错误分类
//!
//! 访客运行时错误（核心异常标签抛出）不是错误值，而是 [`Outcome::GuestTrap`]；
//! 这里的 [`CoreError`] 只表示宿主/基础设施故障，必须一路向上传播。

use thiserror::Error;

/// 链接协议故障（在核心的 `instantiate` 回调内产生）
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("buffer {ptr:#x}+{len} is outside core memory ({memory_size} bytes)")]
    OutOfBounds {
        ptr: u32,
        len: u32,
        memory_size: usize,
    },

    #[error("failed to persist module #{seq}: {source}")]
    Trace {
        seq: u64,
        #[source]
        source: wasche_log::Error,
    },

    #[error("failed to compile module #{seq}: {message}")]
    Compile { seq: u64, message: String },

    #[error("module #{seq} imports `{module}.{name}`, which is not linked yet")]
    UnresolvedImport {
        seq: u64,
        module: String,
        name: String,
    },

    #[error("module #{seq} has no `start` export of type () -> i64")]
    MissingStart { seq: u64 },

    #[error("export `{name}` is already defined; dynamic exports are never reassigned")]
    DuplicateExport { name: String },

    #[error("`{name}` is not a {expected}")]
    UnexpectedExportType { name: String, expected: &'static str },

    #[error("unsupported file descriptor: {fd}")]
    UnsupportedFd { fd: i32 },

    #[error("failed to write to fd {fd}: {source}")]
    Output {
        fd: i32,
        #[source]
        source: std::io::Error,
    },

    #[error("core log write failed: {0}")]
    CoreLog(#[source] wasche_log::Error),

    #[error("instantiate is not supported in AOT mode; run the source instead")]
    AotInstantiate,

    #[error("runtime core is not bound to this store")]
    CoreNotBound,
}

/// 宿主/基础设施故障
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to create wasm engine: {0}")]
    Engine(String),

    #[error("failed to compile runtime core: {0}")]
    CompileCore(String),

    #[error("runtime core is missing export `{name}` ({expected})")]
    MissingExport { name: String, expected: String },

    #[error("core operation `{op}` called before init")]
    NotInitialized { op: &'static str },

    #[error("core operation `{op}` is not allowed after init")]
    AlreadyInitialized { op: &'static str },

    #[error("session already cleaned up")]
    Finished,

    #[error("global `{name}` not found (not linked yet)")]
    GlobalNotFound { name: String },

    #[error("core returned invalid pointer {ptr} from {op}")]
    BadPointer { op: &'static str, ptr: i32 },

    #[error("exception with a foreign tag escaped from the core")]
    ForeignException,

    #[error("guest exception raised during `{op}`, which has no guest-error semantics")]
    UnexpectedGuestTrap { op: &'static str },

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("wasm fault: {0:#}")]
    Wasm(wasmtime::Error),
}

impl CoreError {
    /// 短阶段标签，CLI 报告用
    pub fn phase(&self) -> &'static str {
        match self {
            CoreError::Engine(_) | CoreError::CompileCore(_) | CoreError::MissingExport { .. } => {
                "load"
            }
            CoreError::NotInitialized { .. }
            | CoreError::AlreadyInitialized { .. }
            | CoreError::Finished => "state",
            CoreError::GlobalNotFound { .. } => "resolve",
            CoreError::BadPointer { .. }
            | CoreError::ForeignException
            | CoreError::UnexpectedGuestTrap { .. }
            | CoreError::Wasm(_) => "wasm",
            CoreError::Link(LinkError::Trace { .. } | LinkError::CoreLog(_)) => "trace",
            CoreError::Link(LinkError::Output { .. } | LinkError::UnsupportedFd { .. }) => "io",
            CoreError::Link(_) => "link",
        }
    }
}

/// 访客运行时错误
///
/// 消息文本故意不保留：核心不提供结构化错误信息，
/// 原始文本可能含有不稳定的绝对路径。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestTrap {
    /// 触发时正在处理的链接事件序号（若在链接模块的 `start` 内）
    pub during_link: Option<u64>,
}

/// 一次核心调用的结果：正常完成或访客错误
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Completed(T),
    GuestTrap(GuestTrap),
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_guest_trap(&self) -> bool {
        matches!(self, Outcome::GuestTrap(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::GuestTrap(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::GuestTrap(trap) => Outcome::GuestTrap(trap),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(
            CoreError::GlobalNotFound {
                name: "fib".into()
            }
            .phase(),
            "resolve"
        );
        assert_eq!(
            CoreError::from(LinkError::DuplicateExport {
                name: "global_3".into()
            })
            .phase(),
            "link"
        );
        assert_eq!(CoreError::from(LinkError::UnsupportedFd { fd: 7 }).phase(), "io");
        assert_eq!(CoreError::NotInitialized { op: "load_src" }.phase(), "state");
    }

    #[test]
    fn test_link_error_is_transparent() {
        let err = CoreError::from(LinkError::UnsupportedFd { fd: 3 });
        assert_eq!(err.to_string(), "unsupported file descriptor: 3");
    }

    #[test]
    fn test_outcome_helpers() {
        let done: Outcome<i32> = Outcome::Completed(2);
        assert!(done.is_completed());
        assert_eq!(done.clone().map(|v| v * 21).completed(), Some(42));

        let trapped: Outcome<i32> = Outcome::GuestTrap(GuestTrap { during_link: Some(1) });
        assert!(trapped.is_guest_trap());
        assert_eq!(trapped.completed(), None);
    }
}
