//! 核心生命周期、符号解析与会话跟踪测试

mod common;

use common::*;
use wasche_config::{CompilerConfig, CompilerFlag, SessionOptions};
use wasche_core::{CapturedOutput, CoreError, CoreState, Extern, RuntimeCore, SchemeValue};
use wasche_log::{Level, LogConfig, Logger, SessionLog};

#[test]
fn test_state_machine() {
    let output = CapturedOutput::new();
    let mut core = RuntimeCore::load(
        MOCK_CORE,
        Box::new(output),
        session_log(),
        SessionOptions::script(),
    )
    .unwrap();
    assert_eq!(core.state(), CoreState::Created);

    let err = core.load_src(ANSWER_EXPR.as_bytes()).unwrap_err();
    assert!(matches!(err, CoreError::NotInitialized { op: "load_src" }));

    core.configure(&CompilerConfig::default()).unwrap();
    assert_eq!(core.state(), CoreState::Configured);

    core.init().unwrap();
    assert_eq!(core.state(), CoreState::Initialized);

    let err = core.configure(&CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, CoreError::AlreadyInitialized { op: "configure" }));
    assert!(matches!(core.init(), Err(CoreError::AlreadyInitialized { op: "init" })));

    assert!(core.cleanup().unwrap().is_completed());
    assert_eq!(core.state(), CoreState::Finished);
    assert!(matches!(core.flush_all(), Err(CoreError::Finished)));
}

#[test]
fn test_missing_core_export() {
    let err = RuntimeCore::load(
        "(module (memory (export \"memory\") 1))",
        Box::new(CapturedOutput::new()),
        session_log(),
        SessionOptions::script(),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::MissingExport { ref name, .. } if name == "SCHEME_EXCEPTION"));
    assert_eq!(err.phase(), "load");
}

#[test]
fn test_resolve_global() {
    let (mut core, _output) = boot_with_stdlib(SessionOptions::script());

    assert!(matches!(core.resolve_global("write").unwrap(), Extern::Global(_)));

    let err = core.resolve_global("no-such-name").unwrap_err();
    assert!(matches!(err, CoreError::GlobalNotFound { ref name } if name == "no-such-name"));
    assert_eq!(err.phase(), "resolve");
}

#[test]
fn test_resolve_global_before_definition() {
    let (mut core, _output) = boot_with_stdlib(SessionOptions::script());

    // id 已分配但尚未链接
    assert!(matches!(
        core.resolve_global("answer"),
        Err(CoreError::GlobalNotFound { .. })
    ));

    assert!(core.load_src(DEFINE_ANSWER.as_bytes()).unwrap().is_completed());
    assert!(core.resolve_global("answer").is_ok());

    let seven = SchemeValue(0x3_0000_0000_0007);
    let value = core.call_global("answer", &[seven]).unwrap().completed().unwrap();
    assert_eq!(value.as_fixnum(), Some(7));
}

#[test]
fn test_call_global_write() {
    let (mut core, output) = boot_with_stdlib(SessionOptions::script());

    let value = SchemeValue(0x3_0000_FFFF_FFFF);
    let result = core.call_global("write", &[value]).unwrap().completed().unwrap();
    assert_eq!(result, SchemeValue::UNIT);
    assert!(core.call_global("newline", &[]).unwrap().is_completed());
    assert!(core.flush_all().unwrap().is_completed());

    assert_eq!(output.stdout_string(), "-1\n");
}

#[test]
fn test_unknown_closure_code_is_guest_trap() {
    let (mut core, _output) = boot(SessionOptions::script());

    // 用一个核心不认识的闭包代替标准库的 write
    assert!(core
        .load_src(
            br#"(module
                  (global (export "global_1") i64 (i64.const 0x6000000000009))
                  (func (export "start") (result i64) (i64.const 0x1000000000000)))"#
        )
        .unwrap()
        .is_completed());

    let outcome = core.call_global("write", &[SchemeValue::UNIT]).unwrap();
    assert!(outcome.is_guest_trap());
}

#[test]
fn test_configure_disables_tier_up() {
    let config = CompilerConfig::default().with(CompilerFlag::EnableJit, false);
    let (mut core, _output) = boot_with(SessionOptions::script(), &config);
    assert!(core.load_stdlib().unwrap().is_completed());

    let before = core.links().get();
    for _ in 0..50 {
        assert!(core.call_global("identity", &[SchemeValue::UNIT]).unwrap().is_completed());
    }
    assert_eq!(core.links().get(), before);
}

#[test]
fn test_core_log_reaches_logger() {
    let (logger, ring) = LogConfig::new(Level::Debug).with_ring_buffer(64).init();
    let ring = ring.unwrap();
    let _core = RuntimeCore::boot(
        MOCK_CORE,
        Box::new(CapturedOutput::new()),
        SessionLog::new(logger),
        SessionOptions::script(),
        &CompilerConfig::default(),
    )
    .unwrap();

    assert!(ring
        .dump_records()
        .iter()
        .any(|record| record.target == "wasche::core" && record.message == "mock core initialized"));
}

#[test]
fn test_trace_dir_captures_modules() {
    let dir = temp_dir("trace");
    let log = SessionLog::open(Logger::noop(), Some(&dir), "/opt/cores/mock_core.wasm").unwrap();
    let mut core = RuntimeCore::boot(
        MOCK_CORE,
        Box::new(CapturedOutput::new()),
        log,
        SessionOptions::script(),
        &CompilerConfig::default(),
    )
    .unwrap();
    assert!(core.load_stdlib().unwrap().is_completed());
    assert!(core.load_src(ANSWER_EXPR.as_bytes()).unwrap().is_completed());
    assert!(core.cleanup().unwrap().is_completed());

    let modules = read_files_with_suffix(&dir, ".wasm");
    assert_eq!(modules.len(), 2);
    assert!(modules[0].0.starts_with("mock_core.wasm-"));
    assert_eq!(modules[1].1, ANSWER_EXPR.as_bytes());

    // 只有源码单元带 IR
    let ir = read_files_with_suffix(&dir, ".ir");
    assert_eq!(ir.len(), 1);
    assert!(ir[0].0.ends_with("-1.ir"));
    assert_eq!(ir[0].1, b"(ir load_src)");

    let log_text = String::from_utf8(read_files_with_suffix(&dir, ".log")[0].1.clone()).unwrap();
    assert_eq!(log_text, "mock core initialized\nmock core cleanup\n");

    let _ = std::fs::remove_dir_all(&dir);
}

fn traced_module_bytes(name: &str) -> Vec<Vec<u8>> {
    let dir = temp_dir(name);
    let log = SessionLog::open(Logger::noop(), Some(&dir), "mock_core.wasm").unwrap();
    let mut core = RuntimeCore::boot(
        MOCK_CORE,
        Box::new(CapturedOutput::new()),
        log,
        SessionOptions::script(),
        &CompilerConfig::default(),
    )
    .unwrap();
    assert!(core.load_stdlib().unwrap().is_completed());
    assert!(core.load_src(DEFINE_F.as_bytes()).unwrap().is_completed());
    assert!(core.load_src(CALL_F.as_bytes()).unwrap().is_completed());

    let bytes = read_files_with_suffix(&dir, ".wasm")
        .into_iter()
        .map(|(_, bytes)| bytes)
        .collect();
    let _ = std::fs::remove_dir_all(&dir);
    bytes
}

#[test]
fn test_linked_modules_are_deterministic() {
    let first = traced_module_bytes("determinism-a");
    let second = traced_module_bytes("determinism-b");
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[test]
fn test_trace_has_no_semantic_effect() {
    let dir = temp_dir("no-effect");
    let traced = SessionLog::open(Logger::noop(), Some(&dir), "mock_core.wasm").unwrap();

    let mut results = Vec::new();
    for log in [traced, session_log()] {
        let mut core = RuntimeCore::boot(
            MOCK_CORE,
            Box::new(CapturedOutput::new()),
            log,
            SessionOptions::script(),
            &CompilerConfig::default(),
        )
        .unwrap();
        assert!(core.load_stdlib().unwrap().is_completed());
        assert!(core.load_src(DEFINE_F.as_bytes()).unwrap().is_completed());
        assert!(core.load_src(CALL_F.as_bytes()).unwrap().is_completed());
        let trace: Vec<_> = core.modules().iter().map(|m| (m.seq, m.result)).collect();
        results.push(trace);
    }
    assert_eq!(results[0], results[1]);

    let _ = std::fs::remove_dir_all(&dir);
}
