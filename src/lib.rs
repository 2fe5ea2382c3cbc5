//! Wasche - JIT 编译 Scheme 运行时核心的宿主
//!
//! 运行时核心是一个 wasm 模块，负责内存、值表示、编译器与 JIT；
//! 宿主负责加载它、为它链接源码编译出的每个小程序模块，并把访客错误
//! 和宿主故障区分开。
//!
//! # Architecture
//!
//! ```text
//! wasche-config  - 纯数据：编译开关、会话选项、日志级别
//! wasche-log     - 显式传递的 Logger 与会话跟踪目录
//! wasche-core    - wasmtime 嵌入：核心加载、动态链接、全局解析、AOT
//! wasche-api     - 会话编排、错误桥、快照驱动、预热探针
//! wasche-cli     - `wasche` 命令行
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use wasche::{RunConfig, RuntimeEnv, Session};
//!
//! let core = std::fs::read("runtime.wasm")?;
//! let mut session = Session::new(core, RuntimeEnv::process(), &RunConfig::default())?;
//! session.load_stdlib()?;
//! session.load_src(b"(display (+ 1 2))")?;
//! session.cleanup()?;
//! ```

pub use wasche_api::*;
