//! 动态模块链接器
//!
//! 核心在 `load_src` / `load_stdlib` 内部，每编译出一个顶层单元就重入调用
//! `env.instantiate`。链接器把模块字节复制出核心内存，交给会话日志，
//! 用 `runtime`（核心导出）和 `dynamic`（动态导出表）解析导入，实例化，
//! 发布导出，最后运行 `start()`。
//!
//! 导出在 `start()` 之前发布，所以后编译的代码看得见先前的定义，
//! 反之不成立。
//!
//! `start()` 抛出的访客异常在这里不处理：错误值原样返回，由 wasmtime
//! 重新抛回核心，最终到达触发编译的入口调用。

use crate::env::{STDERR_FD, STDOUT_FD};
use crate::error::LinkError;
use crate::module::{LinkPhase, ProgramModule};
use crate::state::{copy_out, HostState};
use crate::symbols;
use crate::value::SchemeValue;
use wasche_config::Phase;
use wasche_log::{debug, trace};
use wasmtime::{Caller, Extern, Instance, Linker, Module, ThrownException};

const TARGET: &str = Phase::Linker.target();

/// `env` 导入的提供方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LinkMode {
    /// 正常会话：`instantiate` 链接新模块
    Dynamic,
    /// 预编译程序：`instantiate` 是宿主故障
    Aot,
}

/// 核心重入回调携带的参数
#[derive(Clone, Copy, Debug)]
struct LinkRequest {
    buf_ptr: i32,
    buf_size: i32,
    ir_ptr: i32,
    ir_size: i32,
    from_src: bool,
}

/// 定义核心需要的 `env` 导入
pub(crate) fn define_env(linker: &mut Linker<HostState>, mode: LinkMode) -> wasmtime::Result<()> {
    match mode {
        LinkMode::Dynamic => {
            linker.func_wrap(
                "env",
                "instantiate",
                |mut caller: Caller<'_, HostState>,
                 buf_ptr: i32,
                 buf_size: i32,
                 ir_ptr: i32,
                 ir_size: i32,
                 from_src: i32|
                 -> wasmtime::Result<()> {
                    let request = LinkRequest {
                        buf_ptr,
                        buf_size,
                        ir_ptr,
                        ir_size,
                        from_src: from_src != 0,
                    };
                    link(&mut caller, request)
                },
            )?;
        }
        LinkMode::Aot => {
            linker.func_wrap(
                "env",
                "instantiate",
                |_: Caller<'_, HostState>, _: i32, _: i32, _: i32, _: i32, _: i32| -> wasmtime::Result<()> {
                    Err(LinkError::AotInstantiate.into())
                },
            )?;
        }
    }

    linker.func_wrap(
        "env",
        "log",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> wasmtime::Result<()> {
            let memory = caller.data().memory()?;
            let (data, state) = memory.data_and_store_mut(&mut caller);
            let bytes = copy_out(data, ptr, len)?;
            state
                .log
                .core_line(&String::from_utf8_lossy(&bytes))
                .map_err(LinkError::CoreLog)?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        "env",
        "write_buf",
        |mut caller: Caller<'_, HostState>, fd: i32, ptr: i32, len: i32| -> wasmtime::Result<()> {
            if fd != STDOUT_FD && fd != STDERR_FD {
                return Err(LinkError::UnsupportedFd { fd }.into());
            }
            let memory = caller.data().memory()?;
            let (data, state) = memory.data_and_store_mut(&mut caller);
            let bytes = copy_out(data, ptr, len)?;
            state
                .output
                .write_buf(fd, &bytes)
                .map_err(|source| LinkError::Output { fd, source })?;
            Ok(())
        },
    )?;

    Ok(())
}

fn set_phase(caller: &mut Caller<'_, HostState>, index: usize, phase: LinkPhase) {
    let state = caller.data_mut();
    if let Some(module) = state.modules.get_mut(index) {
        trace!(state.log.logger(), target: TARGET, "module #{}: {}", module.seq, phase.as_str());
        module.phase = phase;
    }
}

/// 处理一次链接事件
fn link(caller: &mut Caller<'_, HostState>, request: LinkRequest) -> wasmtime::Result<()> {
    // 回调返回后核心可能复用或扩张内存，必须立即复制
    let memory = caller.data().memory()?;
    let data = memory.data(&*caller);
    let bytes = copy_out(data, request.buf_ptr, request.buf_size)?;
    let ir = if request.ir_size > 0 {
        Some(copy_out(data, request.ir_ptr, request.ir_size)?)
    } else {
        None
    };

    let state = caller.data_mut();
    let seq = state.log.links().get();
    state
        .log
        .instantiate(&bytes, ir.as_deref())
        .map_err(|source| LinkError::Trace { seq, source })?;
    trace!(state.log.logger(), target: TARGET, "module #{seq}: {}", LinkPhase::BlobReceived.as_str());

    let module = Module::new(caller.engine(), &bytes).map_err(|e| LinkError::Compile {
        seq,
        message: format!("{e:#}"),
    })?;

    let core = caller.data().core()?;
    let mut imports: Vec<Extern> = Vec::new();
    for import in module.imports() {
        let resolved = match import.module() {
            "runtime" => core.instance.get_export(&mut *caller, import.name()),
            "dynamic" => caller.data().registry.get(import.name()).cloned(),
            _ => None,
        };
        let item = resolved.ok_or_else(|| LinkError::UnresolvedImport {
            seq,
            module: import.module().to_string(),
            name: import.name().to_string(),
        })?;
        imports.push(item);
    }

    let instance = Instance::new(&mut *caller, &module, &imports)?;
    let index = caller.data().modules.len();
    caller.data_mut().modules.push(ProgramModule {
        seq,
        from_src: request.from_src,
        has_ir: ir.is_some(),
        instance,
        phase: LinkPhase::Instantiated,
        result: None,
    });
    set_phase(caller, index, LinkPhase::Instantiated);

    let start = instance
        .get_typed_func::<(), i64>(&mut *caller, "start")
        .map_err(|_| LinkError::MissingStart { seq })?;

    // 每个模块都有 start，不进入导出表
    let exports: Vec<(String, Extern)> = instance
        .exports(&mut *caller)
        .filter(|export| export.name() != "start")
        .map(|export| (export.name().to_string(), export.into_extern()))
        .collect();
    let published = caller.data_mut().registry.publish_all(exports)?;
    debug!(
        caller.data().log.logger(),
        target: TARGET,
        "module #{seq} linked: {} bytes, {published} exports, from_src={}",
        bytes.len(),
        request.from_src
    );

    set_phase(caller, index, LinkPhase::Started);
    let result = match start.call(&mut *caller, ()) {
        Ok(raw) => SchemeValue::from_raw(raw),
        Err(err) => {
            if err.is::<ThrownException>() {
                set_phase(caller, index, LinkPhase::GuestTrap);
                caller.data_mut().trapped_link.get_or_insert(seq);
            }
            return Err(err);
        }
    };
    let state = caller.data_mut();
    if let Some(module) = state.modules.get_mut(index) {
        module.result = Some(result);
    }
    // 更早的嵌套链接若抛出过异常，核心已经把它吞掉了
    state.trapped_link = None;
    set_phase(caller, index, LinkPhase::ResultReady);

    if request.from_src && caller.data().options.echo_results {
        echo(caller, result)?;
    }
    Ok(())
}

/// REPL 回显：`(write result)` 然后 `(newline)`
fn echo(caller: &mut Caller<'_, HostState>, value: SchemeValue) -> wasmtime::Result<()> {
    let core = caller.data().core()?;
    symbols::call_named(&mut *caller, &core, "write", &[value])?;
    symbols::call_named(&mut *caller, &core, "newline", &[])?;
    Ok(())
}
