//! 测试辅助工具

#![allow(dead_code)]

use std::path::PathBuf;
use wasche_api::{ExitRecorder, RunConfig, RuntimeEnv, Session};
use wasche_core::CapturedOutput;

pub const MOCK_CORE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../fixtures/cores/mock_core.wat"
));

pub fn programs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../fixtures/programs")
}

pub fn program(name: &str) -> Vec<u8> {
    std::fs::read(programs_dir().join(name)).expect("fixture should exist")
}

/// 捕获输出的会话
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

pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wasche-api-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// 真实运行时核心；未设置 `WASCHE_RUNTIME` 时返回 `None`
pub fn real_core() -> Option<Vec<u8>> {
    let path = std::env::var_os(wasche_config::RUNTIME_ENV)?;
    Some(std::fs::read(path).expect("WASCHE_RUNTIME should point at a readable core"))
}
