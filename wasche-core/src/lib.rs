//! Wasche Core - 运行时核心的宿主嵌入层
//!
//! 一个静态加载的运行时核心（wasm 模块）提供内存、标记值表示、编译器/JIT
//! 和调用约定；源码被按需编译成一串小的程序模块，每个模块单独实例化，
//! 并链接到核心和所有先前链接的模块上。
//!
//! - [`value`]: 标记字的诊断解码
//! - [`RuntimeCore`]: 加载、配置、`init`，以及带错误守卫的执行入口
//! - 动态链接器：处理核心的重入 `instantiate` 回调，维护 [`ExportRegistry`]
//! - [`AotProgram`]: 运行预编译的自包含模块
//!
//! 单线程、完全同步：一次 `load_src` 及其触发的所有嵌套链接返回之前，
//! 不能再次调用入口。

pub mod aot;
pub mod engine;
pub mod env;
pub mod error;
mod linker;
pub mod loader;
pub mod module;
pub mod registry;
mod state;
mod symbols;
pub mod value;

pub use aot::AotProgram;
pub use engine::{compile, shared_engine};
pub use env::{CapturedOutput, NullOutput, OutputSink, ProcessOutput, STDERR_FD, STDOUT_FD};
pub use error::{CoreError, CoreResult, GuestTrap, LinkError, Outcome};
pub use loader::{CoreState, RuntimeCore, EXCEPTION_TAG};
pub use module::{LinkPhase, ProgramModule};
pub use registry::{global_key, ExportRegistry};
pub use value::{DecodeError, SchemeValue, ValueTag};

// 下游 crate 不需要直接依赖 wasmtime 就能使用这些句柄
pub use wasmtime::{Extern, Module};
