//! 进程级共享的 wasmtime 引擎

use crate::error::CoreError;
use once_cell::sync::OnceCell;
use wasmtime::{Config, Engine, Module};

static ENGINE: OnceCell<Engine> = OnceCell::new();

/// 核心和编译产物依赖 GC 引用、尾调用和异常处理提案
fn engine_config() -> Config {
    let mut config = Config::new();
    config
        .wasm_gc(true)
        .wasm_function_references(true)
        .wasm_tail_call(true)
        .wasm_exceptions(true);
    config
}

/// 每个会话有自己的 `Store`，引擎本身无状态地共享
pub fn shared_engine() -> Result<&'static Engine, CoreError> {
    ENGINE.get_or_try_init(|| {
        Engine::new(&engine_config()).map_err(|e| CoreError::Engine(format!("{e:#}")))
    })
}

/// 编译核心或 AOT 模块（二进制或文本格式均可）
pub fn compile(bytes: impl AsRef<[u8]>) -> Result<Module, CoreError> {
    let engine = shared_engine()?;
    Module::new(engine, bytes.as_ref()).map_err(|e| CoreError::CompileCore(format!("{e:#}")))
}
