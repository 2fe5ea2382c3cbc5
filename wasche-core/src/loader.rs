//! 运行时核心加载器与执行入口
//!
//! `RuntimeCore` 是会话唯一的长生命周期虚拟机实例：
//! `Created → Configured → Initialized → Finished`。
//! 每个入口调用都经过 [`RuntimeCore::guarded`]：核心异常标签抛出的错误
//! 变为 [`Outcome::GuestTrap`]，其他一切都是 [`CoreError`]。

use crate::engine::{compile, shared_engine};
use crate::env::OutputSink;
use crate::error::{CoreError, CoreResult, GuestTrap, LinkError, Outcome};
use crate::linker::{define_env, LinkMode};
use crate::module::ProgramModule;
use crate::registry::ExportRegistry;
use crate::state::HostState;
use crate::symbols;
use crate::value::{DecodeError, SchemeValue};
use wasche_config::{CompilerConfig, Phase, SessionOptions};
use wasche_log::{debug, info, LinkCounter, SessionLog};
use wasmtime::{
    Extern, Instance, Linker, Memory, Module, Store, Tag, ThrownException, TypedFunc, WasmParams,
    WasmResults,
};

const TARGET: &str = Phase::Core.target();

/// 核心导出的异常标签名
pub const EXCEPTION_TAG: &str = "SCHEME_EXCEPTION";

/// 核心生命周期
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreState {
    Created,
    Configured,
    Initialized,
    Finished,
}

/// 宿主使用的核心导出
#[derive(Clone)]
pub(crate) struct CoreExports {
    pub(crate) instance: Instance,
    pub(crate) memory: Memory,
    pub(crate) exception_tag: Tag,
    pub(crate) malloc: TypedFunc<i32, i32>,
    pub(crate) free: TypedFunc<i32, ()>,
    pub(crate) init: TypedFunc<(), ()>,
    pub(crate) load_stdlib: TypedFunc<(), ()>,
    pub(crate) load_src: TypedFunc<(i32, i32), ()>,
    pub(crate) flush_all: TypedFunc<(), ()>,
    pub(crate) cleanup: TypedFunc<(), ()>,
    pub(crate) get_global_id: TypedFunc<(i32, i32), i32>,
    pub(crate) new_args: TypedFunc<i32, i32>,
    pub(crate) set_args: TypedFunc<(i32, i32, i64), ()>,
    pub(crate) call_closure: TypedFunc<(i64, i32), i64>,
}

fn typed<P: WasmParams, R: WasmResults>(
    store: &mut Store<HostState>,
    instance: &Instance,
    name: &str,
) -> CoreResult<TypedFunc<P, R>> {
    instance
        .get_typed_func::<P, R>(&mut *store, name)
        .map_err(|e| CoreError::MissingExport {
            name: name.to_string(),
            expected: format!("{e:#}"),
        })
}

impl CoreExports {
    fn bind(store: &mut Store<HostState>, instance: Instance) -> CoreResult<Self> {
        let memory = instance
            .get_memory(&mut *store, "memory")
            .ok_or_else(|| CoreError::MissingExport {
                name: "memory".to_string(),
                expected: "memory".to_string(),
            })?;
        let exception_tag = instance
            .get_tag(&mut *store, EXCEPTION_TAG)
            .ok_or_else(|| CoreError::MissingExport {
                name: EXCEPTION_TAG.to_string(),
                expected: "tag".to_string(),
            })?;
        Ok(CoreExports {
            instance,
            memory,
            exception_tag,
            malloc: typed(store, &instance, "malloc")?,
            free: typed(store, &instance, "free")?,
            init: typed(store, &instance, "init")?,
            load_stdlib: typed(store, &instance, "load_stdlib")?,
            load_src: typed(store, &instance, "load_src")?,
            flush_all: typed(store, &instance, "flush_all")?,
            cleanup: typed(store, &instance, "cleanup")?,
            get_global_id: typed(store, &instance, "get_global_id")?,
            new_args: typed(store, &instance, "new_args")?,
            set_args: typed(store, &instance, "set_args")?,
            call_closure: typed(store, &instance, "call_closure")?,
        })
    }
}

/// 把任意 wasm 错误还原为宿主故障
pub(crate) fn into_core_error(err: wasmtime::Error) -> CoreError {
    let err = match err.downcast::<LinkError>() {
        Ok(link) => return CoreError::Link(link),
        Err(err) => err,
    };
    match err.downcast::<CoreError>() {
        Ok(core) => core,
        Err(err) => CoreError::Wasm(err),
    }
}

/// 区分访客异常和宿主故障
fn classify<T>(
    store: &mut Store<HostState>,
    exception_tag: &Tag,
    result: wasmtime::Result<T>,
) -> CoreResult<Outcome<T>> {
    let during_link = store.data_mut().trapped_link.take();
    let err = match result {
        Ok(value) => return Ok(Outcome::Completed(value)),
        Err(err) => err,
    };
    if !err.is::<ThrownException>() {
        return Err(into_core_error(err));
    }
    let Some(exception) = store.take_pending_exception() else {
        return Err(CoreError::Wasm(err));
    };
    let tag = exception.tag(&mut *store).map_err(CoreError::Wasm)?;
    if Tag::eq(&tag, exception_tag, &*store) {
        Ok(Outcome::GuestTrap(GuestTrap { during_link }))
    } else {
        Err(CoreError::ForeignException)
    }
}

/// 已实例化的运行时核心
pub struct RuntimeCore {
    store: Store<HostState>,
    core: CoreExports,
    state: CoreState,
}

impl RuntimeCore {
    /// 实例化核心（不调用 `init`）
    pub fn load(
        core_bytes: impl AsRef<[u8]>,
        output: Box<dyn OutputSink>,
        log: SessionLog,
        options: SessionOptions,
    ) -> CoreResult<Self> {
        let module = compile(core_bytes)?;
        Self::from_module(&module, output, log, options)
    }

    /// 用已编译的核心模块实例化，基准测试每次迭代都走这里
    pub fn from_module(
        module: &Module,
        output: Box<dyn OutputSink>,
        log: SessionLog,
        options: SessionOptions,
    ) -> CoreResult<Self> {
        let engine = shared_engine()?;
        let mut store = Store::new(engine, HostState::new(log, output, options));
        let mut linker = Linker::new(engine);
        define_env(&mut linker, LinkMode::Dynamic).map_err(CoreError::Wasm)?;

        let instance = linker
            .instantiate(&mut store, module)
            .map_err(into_core_error)?;
        let core = CoreExports::bind(&mut store, instance)?;
        store.data_mut().memory = Some(core.memory);
        store.data_mut().core = Some(core.clone());
        debug!(store.data().log.logger(), target: TARGET, "runtime core instantiated");

        Ok(RuntimeCore {
            store,
            core,
            state: CoreState::Created,
        })
    }

    /// 加载、应用编译配置、调用 `init`
    pub fn boot(
        core_bytes: impl AsRef<[u8]>,
        output: Box<dyn OutputSink>,
        log: SessionLog,
        options: SessionOptions,
        config: &CompilerConfig,
    ) -> CoreResult<Self> {
        let mut core = Self::load(core_bytes, output, log, options)?;
        core.configure(config)?;
        core.init()?;
        Ok(core)
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    /// 通过导出的 setter 应用每个已定义的编译开关；只能在 `init` 之前
    pub fn configure(&mut self, config: &CompilerConfig) -> CoreResult<()> {
        match self.state {
            CoreState::Created | CoreState::Configured => {}
            CoreState::Initialized => return Err(CoreError::AlreadyInitialized { op: "configure" }),
            CoreState::Finished => return Err(CoreError::Finished),
        }
        let instance = self.core.instance;
        for (flag, value) in config.defined_flags() {
            let setter: TypedFunc<i32, ()> = typed(&mut self.store, &instance, flag.setter())?;
            setter
                .call(&mut self.store, i32::from(value))
                .map_err(into_core_error)?;
            debug!(self.logger(), target: TARGET, "{} = {value}", flag.key());
        }
        self.state = CoreState::Configured;
        Ok(())
    }

    /// 调用核心 `init`，恰好一次
    pub fn init(&mut self) -> CoreResult<()> {
        match self.state {
            CoreState::Created | CoreState::Configured => {}
            CoreState::Initialized => return Err(CoreError::AlreadyInitialized { op: "init" }),
            CoreState::Finished => return Err(CoreError::Finished),
        }
        let result = self.core.init.call(&mut self.store, ());
        match classify(&mut self.store, &self.core.exception_tag, result)? {
            Outcome::Completed(()) => {}
            Outcome::GuestTrap(_) => return Err(CoreError::UnexpectedGuestTrap { op: "init" }),
        }
        self.state = CoreState::Initialized;
        info!(self.logger(), target: TARGET, "runtime core initialized");
        Ok(())
    }

    fn require_initialized(&self, op: &'static str) -> CoreResult<()> {
        match self.state {
            CoreState::Initialized => Ok(()),
            CoreState::Finished => Err(CoreError::Finished),
            CoreState::Created | CoreState::Configured => Err(CoreError::NotInitialized { op }),
        }
    }

    /// 统一守卫：状态检查 + 访客/宿主错误区分
    fn guarded<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Store<HostState>, &CoreExports) -> wasmtime::Result<T>,
    ) -> CoreResult<Outcome<T>> {
        self.require_initialized(op)?;
        // 核心自己捕获过的访客异常不能算到这次调用头上
        self.store.data_mut().trapped_link = None;
        let result = f(&mut self.store, &self.core);
        let outcome = classify(&mut self.store, &self.core.exception_tag, result)?;
        if let Outcome::GuestTrap(trap) = &outcome {
            debug!(self.logger(), target: TARGET, "{op}: guest trap (link {:?})", trap.during_link);
        }
        Ok(outcome)
    }

    pub fn load_stdlib(&mut self) -> CoreResult<Outcome<()>> {
        self.guarded("load_stdlib", |store, core| core.load_stdlib.call(store, ()))
    }

    /// 把源码复制进核心内存并编译执行；核心在返回前消费完缓冲区
    pub fn load_src(&mut self, src: &[u8]) -> CoreResult<Outcome<()>> {
        self.guarded("load_src", |store, core| {
            let len = i32::try_from(src.len())?;
            let ptr = core.malloc.call(&mut *store, len)?;
            core.memory
                .write(&mut *store, ptr as u32 as usize, src)
                .map_err(|_| CoreError::BadPointer { op: "malloc", ptr })?;
            core.load_src.call(&mut *store, (ptr, len))?;
            core.free.call(&mut *store, ptr)
        })
    }

    pub fn flush_all(&mut self) -> CoreResult<Outcome<()>> {
        self.guarded("flush_all", |store, core| core.flush_all.call(store, ()))
    }

    /// 会话结束时调用一次；之后任何入口都返回 [`CoreError::Finished`]
    pub fn cleanup(&mut self) -> CoreResult<Outcome<()>> {
        let outcome = self.guarded("cleanup", |store, core| core.cleanup.call(store, ()))?;
        self.state = CoreState::Finished;
        Ok(outcome)
    }

    /// 名字 → id → `global_<id>`；尚未链接时返回 [`CoreError::GlobalNotFound`]
    pub fn resolve_global(&mut self, name: &str) -> CoreResult<Extern> {
        match self.guarded("resolve_global", |store, _| symbols::lookup_global(store, name))? {
            Outcome::Completed(Some(item)) => Ok(item),
            Outcome::Completed(None) => Err(CoreError::GlobalNotFound {
                name: name.to_string(),
            }),
            Outcome::GuestTrap(_) => Err(CoreError::UnexpectedGuestTrap {
                op: "resolve_global",
            }),
        }
    }

    /// 解析并调用一个已链接的 Scheme 过程
    pub fn call_global(&mut self, name: &str, args: &[SchemeValue]) -> CoreResult<Outcome<SchemeValue>> {
        self.guarded("call_global", |store, core| {
            symbols::call_named(store, core, name, args)
        })
    }

    /// 解析一次、多次调用：返回名字绑定的闭包值
    pub fn closure(&mut self, name: &str) -> CoreResult<SchemeValue> {
        let item = self.resolve_global(name)?;
        Ok(symbols::closure_value(&mut self.store, name, &item)?)
    }

    pub fn call_closure(
        &mut self,
        closure: SchemeValue,
        args: &[SchemeValue],
    ) -> CoreResult<Outcome<SchemeValue>> {
        self.guarded("call_closure", |store, core| {
            symbols::call_closure(store, core, closure, args)
        })
    }

    /// 以当前核心内存解码一个值
    pub fn describe(&self, value: SchemeValue) -> Result<String, DecodeError> {
        value.describe(self.core.memory.data(&self.store))
    }

    pub fn modules(&self) -> &[ProgramModule] {
        &self.store.data().modules
    }

    /// 最近一次完成的 `start()` 返回值
    pub fn last_result(&self) -> Option<SchemeValue> {
        self.modules().iter().rev().find_map(|module| module.result)
    }

    pub fn registry(&self) -> &ExportRegistry {
        &self.store.data().registry
    }

    pub fn links(&self) -> LinkCounter {
        self.store.data().log.links()
    }

    pub fn session_log(&self) -> &SessionLog {
        &self.store.data().log
    }

    pub fn options(&self) -> SessionOptions {
        self.store.data().options
    }

    pub fn flush_output(&mut self) -> std::io::Result<()> {
        self.store.data_mut().output.flush()
    }

    fn logger(&self) -> &std::sync::Arc<wasche_log::Logger> {
        self.store.data().log.logger()
    }
}

impl std::fmt::Debug for RuntimeCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeCore")
            .field("state", &self.state)
            .field("modules", &self.modules().len())
            .field("registry", self.registry())
            .finish()
    }
}
