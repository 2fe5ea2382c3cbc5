//! `Store` 中的宿主状态

use crate::env::OutputSink;
use crate::error::LinkError;
use crate::loader::CoreExports;
use crate::module::ProgramModule;
use crate::registry::ExportRegistry;
use wasche_config::SessionOptions;
use wasche_log::SessionLog;
use wasmtime::Memory;

/// 会话唯一的可变状态，由核心的 `Store` 独占
pub(crate) struct HostState {
    pub(crate) log: SessionLog,
    pub(crate) output: Box<dyn OutputSink>,
    pub(crate) options: SessionOptions,
    pub(crate) registry: ExportRegistry,
    pub(crate) modules: Vec<ProgramModule>,
    /// 核心实例化完成后才绑定
    pub(crate) core: Option<CoreExports>,
    pub(crate) memory: Option<Memory>,
    /// 最内层抛出访客异常的链接事件
    pub(crate) trapped_link: Option<u64>,
}

impl HostState {
    pub(crate) fn new(log: SessionLog, output: Box<dyn OutputSink>, options: SessionOptions) -> Self {
        HostState {
            log,
            output,
            options,
            registry: ExportRegistry::new(),
            modules: Vec::new(),
            core: None,
            memory: None,
            trapped_link: None,
        }
    }

    pub(crate) fn memory(&self) -> Result<Memory, LinkError> {
        self.memory.ok_or(LinkError::CoreNotBound)
    }

    pub(crate) fn core(&self) -> Result<CoreExports, LinkError> {
        self.core.clone().ok_or(LinkError::CoreNotBound)
    }
}

/// 按 (ptr, len) 从核心内存复制一段字节
///
/// 指针按 wasm32 无符号地址解释。
pub(crate) fn copy_out(data: &[u8], ptr: i32, len: i32) -> Result<Vec<u8>, LinkError> {
    let (start, size) = (ptr as u32, len as u32);
    let out_of_bounds = || LinkError::OutOfBounds {
        ptr: start,
        len: size,
        memory_size: data.len(),
    };
    let end = (start as usize)
        .checked_add(size as usize)
        .ok_or_else(out_of_bounds)?;
    data.get(start as usize..end)
        .map(<[u8]>::to_vec)
        .ok_or_else(out_of_bounds)
}
