//! 测试辅助工具
//!
//! 用 `fixtures/cores/mock_core.wat` 作为运行时核心。mock 的"编译器"是恒等变换，
//! 所以这里的"源码"就是 wasm 文本格式的程序模块。

#![allow(dead_code)]

use std::path::Path;
use wasche_config::{CompilerConfig, SessionOptions};
use wasche_core::{CapturedOutput, RuntimeCore};
use wasche_log::{Logger, SessionLog};

pub const MOCK_CORE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../fixtures/cores/mock_core.wat"
));

pub const UNIT: i64 = 0x1_0000_0000_0000;

/// 定义 `f(x) = x + 1`
pub const DEFINE_F: &str = r#"
(module
  (import "runtime" "fixnum" (func $fixnum (param i32) (result i64)))
  (func (export "f") (param $x i32) (result i64)
    (call $fixnum (i32.add (local.get $x) (i32.const 1))))
  (func (export "start") (result i64) (i64.const 0x1000000000000)))
"#;

/// `(f 41)`
pub const CALL_F: &str = r#"
(module
  (import "dynamic" "f" (func $f (param i32) (result i64)))
  (func (export "start") (result i64) (call $f (i32.const 41))))
"#;

/// 结果为 fixnum 42 的表达式
pub const ANSWER_EXPR: &str = r#"
(module
  (func (export "start") (result i64) (i64.const 0x300000000002A)))
"#;

/// `(define answer identity)`：名字 answer 的预分配 id 是 4
pub const DEFINE_ANSWER: &str = r#"
(module
  (global (export "global_4") i64 (i64.const 0x6000000000003))
  (func (export "start") (result i64) (i64.const 0x1000000000000)))
"#;

/// 访客运行时错误
pub const RAISE: &str = r#"
(module
  (import "runtime" "raise" (func $raise))
  (func (export "start") (result i64)
    (call $raise)
    (i64.const 0x1000000000000)))
"#;

/// 抛出非核心标签的异常
pub const RAISE_FOREIGN: &str = r#"
(module
  (import "runtime" "raise_foreign" (func $raise))
  (func (export "start") (result i64)
    (call $raise)
    (i64.const 0x1000000000000)))
"#;

/// 打印 7 后返回 unit
pub const PRINT_SEVEN: &str = r#"
(module
  (import "runtime" "print" (func $print (param i64)))
  (func (export "start") (result i64)
    (call $print (i64.const 0x3000000000007))
    (i64.const 0x1000000000000)))
"#;

/// 在嵌套的 `load_src` 里运行会抛错的单元，并自己捕获这个访客异常；
/// 捕获后结果为 fixnum 2，未捕获则为 1
pub const CATCH_NESTED_RAISE: &str = r#"
(module
  (import "runtime" "memory" (memory 1))
  (import "runtime" "malloc" (func $malloc (param i32) (result i32)))
  (import "runtime" "load_src" (func $load_src (param i32 i32)))
  (import "runtime" "SCHEME_EXCEPTION" (tag $scheme))
  (data $inner "(module (import \"runtime\" \"raise\" (func $r)) (func (export \"start\") (result i64) (call $r) (i64.const 0x1000000000000)))")
  (func (export "start") (result i64)
    (local $p i32)
    (local.set $p (call $malloc (i32.const 120)))
    (memory.init $inner (local.get $p) (i32.const 0) (i32.const 120))
    (block $caught
      (try_table (catch $scheme $caught)
        (call $load_src (local.get $p) (i32.const 120)))
      (return (i64.const 0x3000000000001)))
    (i64.const 0x3000000000002)))
"#;

pub fn session_log() -> SessionLog {
    SessionLog::new(Logger::noop())
}

/// 加载、配置并初始化 mock 核心，输出捕获到内存
pub fn boot_with(options: SessionOptions, config: &CompilerConfig) -> (RuntimeCore, CapturedOutput) {
    let output = CapturedOutput::new();
    let core = RuntimeCore::boot(
        MOCK_CORE,
        Box::new(output.clone()),
        session_log(),
        options,
        config,
    )
    .expect("mock core should boot");
    (core, output)
}

pub fn boot(options: SessionOptions) -> (RuntimeCore, CapturedOutput) {
    boot_with(options, &CompilerConfig::default())
}

/// 已加载 stdlib 的脚本会话
pub fn boot_with_stdlib(options: SessionOptions) -> (RuntimeCore, CapturedOutput) {
    let (mut core, output) = boot(options);
    assert!(core.load_stdlib().expect("stdlib should link").is_completed());
    (core, output)
}

/// 测试专用的临时目录，每次调用都重新创建
pub fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("wasche-core-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

pub fn read_files_with_suffix(dir: &Path, suffix: &str) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = std::fs::read_dir(dir)
        .expect("trace dir should exist")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.to_string_lossy().ends_with(suffix))
        .map(|path| {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let bytes = std::fs::read(&path).unwrap();
            (name, bytes)
        })
        .collect();
    files.sort();
    files
}
