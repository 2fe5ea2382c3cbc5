//! 预编译（AOT）程序运行器
//!
//! AOT 产物是一个自包含模块：运行时和程序编译在一起，只需要 `env` 导入。
//! 这里没有访客错误转换，任何失败都作为 [`CoreError`] 返回。

use crate::engine::{compile, shared_engine};
use crate::env::{OutputSink, STDOUT_FD};
use crate::error::{CoreError, CoreResult, LinkError};
use crate::linker::{define_env, LinkMode};
use crate::loader::into_core_error;
use crate::state::HostState;
use wasche_config::{Phase, SessionOptions};
use wasche_log::{debug, SessionLog};
use wasmtime::{Instance, Linker, Store, Val};

const TARGET: &str = Phase::Core.target();

pub struct AotProgram {
    store: Store<HostState>,
    instance: Instance,
}

impl AotProgram {
    pub fn load(
        bytes: impl AsRef<[u8]>,
        output: Box<dyn OutputSink>,
        log: SessionLog,
    ) -> CoreResult<Self> {
        let module = compile(bytes)?;
        let engine = shared_engine()?;
        let mut store = Store::new(engine, HostState::new(log, output, SessionOptions::script()));
        let mut linker = Linker::new(engine);
        define_env(&mut linker, LinkMode::Aot).map_err(CoreError::Wasm)?;

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(into_core_error)?;
        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| CoreError::MissingExport {
                name: "memory".to_string(),
                expected: "memory".to_string(),
            })?;
        store.data_mut().memory = Some(memory);

        Ok(AotProgram { store, instance })
    }

    /// 入口函数名：以 `start` 开头的导出，按导出顺序倒序
    ///
    /// 运行时的入口排在程序之后导出，所以必须倒序执行。
    pub fn entry_points(&mut self) -> Vec<String> {
        let names: Vec<String> = self
            .instance
            .exports(&mut self.store)
            .map(|export| export.name().to_string())
            .filter(|name| name.starts_with("start"))
            .collect();
        names
            .into_iter()
            .rev()
            .filter(|name| self.instance.get_func(&mut self.store, name).is_some())
            .collect()
    }

    /// 依次调用全部入口，然后调用 `cleanup`
    pub fn run(&mut self) -> CoreResult<()> {
        for name in self.entry_points() {
            self.call_entry(&name)?;
        }
        let cleanup = self
            .instance
            .get_typed_func::<(), ()>(&mut self.store, "cleanup")
            .map_err(|e| CoreError::MissingExport {
                name: "cleanup".to_string(),
                expected: format!("{e:#}"),
            })?;
        cleanup.call(&mut self.store, ()).map_err(into_core_error)?;
        self.store
            .data_mut()
            .output
            .flush()
            .map_err(|source| LinkError::Output { fd: STDOUT_FD, source })?;
        Ok(())
    }

    fn call_entry(&mut self, name: &str) -> CoreResult<()> {
        let func = self
            .instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| CoreError::MissingExport {
                name: name.to_string(),
                expected: "func".to_string(),
            })?;
        let ty = func.ty(&self.store);
        if ty.params().len() != 0 {
            return Err(CoreError::MissingExport {
                name: name.to_string(),
                expected: "func taking no parameters".to_string(),
            });
        }
        // 结果槽位只要求数量正确，调用会覆盖其中的值
        let mut results = vec![Val::I32(0); ty.results().len()];
        debug!(self.store.data().log.logger(), target: TARGET, "aot entry {name}");
        func.call(&mut self.store, &[], &mut results)
            .map_err(into_core_error)
    }

    pub fn links(&self) -> wasche_log::LinkCounter {
        self.store.data().log.links()
    }
}
