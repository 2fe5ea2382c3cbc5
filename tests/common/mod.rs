//! 测试辅助工具
//!
//! 工作区级测试同样以 mock 核心为运行时；程序模块用 wasm 文本写成。

#![allow(dead_code)]

use wasche::{CapturedOutput, ExitRecorder, RunConfig, RuntimeEnv, Session};

pub const MOCK_CORE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/fixtures/cores/mock_core.wat"
));

pub const SCHEME_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/scheme");

/// `(define (f x) (+ x 1))`
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

/// `"abc"`：在核心堆上分配 u32 长度加 UTF-8 字节
pub const STRING_ABC: &str = r#"
(module
  (import "runtime" "memory" (memory 1))
  (import "runtime" "malloc" (func $malloc (param i32) (result i32)))
  (func (export "start") (result i64)
    (local $p i32)
    (local.set $p (call $malloc (i32.const 8)))
    (i32.store (local.get $p) (i32.const 3))
    (i32.store8 offset=4 (local.get $p) (i32.const 97))
    (i32.store8 offset=5 (local.get $p) (i32.const 98))
    (i32.store8 offset=6 (local.get $p) (i32.const 99))
    (i64.or (i64.const 0x5000000000000) (i64.extend_i32_u (local.get $p)))))
"#;

/// `(cons 1 2)`
pub const PAIR_1_2: &str = r#"
(module
  (import "runtime" "memory" (memory 1))
  (import "runtime" "malloc" (func $malloc (param i32) (result i32)))
  (func (export "start") (result i64)
    (local $p i32)
    (local.set $p (call $malloc (i32.const 16)))
    (i64.store (local.get $p) (i64.const 0x3000000000001))
    (i64.store offset=8 (local.get $p) (i64.const 0x3000000000002))
    (i64.or (i64.const 0x4000000000000) (i64.extend_i32_u (local.get $p)))))
"#;

/// 写出 1 之后抛出访客错误，之后的 2 不应出现
pub const PRINT_THEN_RAISE: &str = r#"
(module
  (import "runtime" "print" (func $print (param i64)))
  (import "runtime" "raise" (func $raise))
  (func (export "start") (result i64)
    (call $print (i64.const 0x3000000000001))
    (call $raise)
    (call $print (i64.const 0x3000000000002))
    (i64.const 0x1000000000000)))
"#;

/// `(define answer identity)`：answer 的预分配 id 是 4
pub const DEFINE_ANSWER: &str = r#"
(module
  (global (export "global_4") i64 (i64.const 0x6000000000003))
  (func (export "start") (result i64) (i64.const 0x1000000000000)))
"#;

pub struct Harness {
    pub session: Session,
    pub output: CapturedOutput,
    pub exits: ExitRecorder,
}

pub fn harness(config: &RunConfig) -> Harness {
    let (env, output, exits) = RuntimeEnv::captured();
    let session = Session::new(MOCK_CORE, env, config).expect("mock core should boot");
    Harness {
        session,
        output,
        exits,
    }
}

pub fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("wasche-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// 按文件名排序读出目录中所有 `.wasm` 文件
pub fn linked_modules(dir: &std::path::Path) -> Vec<Vec<u8>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .expect("trace dir should exist")
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "wasm"))
        .collect();
    // <base>-<n>.wasm：按 n 排序
    paths.sort_by_key(|path| {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.rsplit('-').next())
            .and_then(|n| n.parse::<u64>().ok())
    });
    paths.iter().map(|path| std::fs::read(path).unwrap()).collect()
}

pub fn real_core() -> Option<Vec<u8>> {
    let path = std::env::var_os(wasche::wasche_config::RUNTIME_ENV)?;
    Some(std::fs::read(path).expect("WASCHE_RUNTIME should point at a readable core"))
}
