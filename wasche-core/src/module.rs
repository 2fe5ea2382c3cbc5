//! 已链接的程序模块记录

use crate::value::SchemeValue;
use wasmtime::Instance;

/// 单次链接事件的进度
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkPhase {
    Idle,
    BlobReceived,
    Instantiated,
    Started,
    ResultReady,
    GuestTrap,
}

impl LinkPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkPhase::Idle => "idle",
            LinkPhase::BlobReceived => "blob-received",
            LinkPhase::Instantiated => "instantiated",
            LinkPhase::Started => "started",
            LinkPhase::ResultReady => "result-ready",
            LinkPhase::GuestTrap => "guest-trap",
        }
    }
}

/// 一个编译并链接完成的单元（stdlib、REPL 的一块输入、一个脚本）
///
/// 会话存续期间一直保留，不会被单独释放。
#[derive(Debug, Clone)]
pub struct ProgramModule {
    /// 链接序号，从 0 开始
    pub seq: u64,
    /// 来自交互式源码（而不是 stdlib 或 JIT 重新编译）
    pub from_src: bool,
    pub has_ir: bool,
    pub instance: Instance,
    pub phase: LinkPhase,
    /// `start()` 的返回值
    pub result: Option<SchemeValue>,
}
