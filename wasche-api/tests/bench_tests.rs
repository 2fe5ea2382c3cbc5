//! 预热探针测试（mock 核心的 identity 模拟分层重编译）

mod common;

use common::*;
use wasche_api::{
    ApiError, CompilerConfig, CompilerFlag, RunConfig, SchemeValue, WarmupProbe,
};

const ARG: SchemeValue = SchemeValue(0x3_0000_0000_0003);

fn probe_with(config: CompilerConfig) -> Result<wasche_api::WarmupReport, ApiError> {
    let mut h = harness(&RunConfig::default().with_compiler(config));
    h.session.load_stdlib().unwrap();
    WarmupProbe::default().run(&mut h.session, "identity", &[ARG])
}

#[test]
fn test_tier_up_inside_warmup_is_allowed() {
    let report = probe_with(CompilerConfig::default()).unwrap();
    assert_eq!(report.warmup_links, 1);
    assert_eq!(report.measured, 1000);
    assert_eq!(report.last_result, ARG);
}

#[test]
fn test_no_jit_never_relinks() {
    let report = probe_with(CompilerConfig::default().with(CompilerFlag::EnableJit, false)).unwrap();
    assert_eq!(report.warmup_links, 0);
}

#[test]
fn test_relink_during_measurement_is_an_error() {
    let config = CompilerConfig::default().with(CompilerFlag::EnableJitOptimization, true);
    let err = probe_with(config).unwrap_err();
    assert!(matches!(
        err,
        ApiError::RelinkDuringMeasurement {
            warmup: 30,
            extra_links: 1
        }
    ));
    assert_eq!(err.phase(), "bench");
}

#[test]
fn test_short_warmup_catches_first_tier_up() {
    let mut h = harness(&RunConfig::default());
    h.session.load_stdlib().unwrap();

    let err = WarmupProbe::new(10, 100)
        .run(&mut h.session, "identity", &[ARG])
        .unwrap_err();
    assert!(matches!(err, ApiError::RelinkDuringMeasurement { warmup: 10, .. }));
}

#[test]
fn test_guest_trap_during_probe() {
    let mut h = harness(&RunConfig::default());
    h.session.load_stdlib().unwrap();

    // answer 绑定到核心不认识的闭包代码
    h.session
        .load_src(
            br#"(module
                  (global (export "global_4") i64 (i64.const 0x6000000000063))
                  (func (export "start") (result i64) (i64.const 0x1000000000000)))"#,
        )
        .unwrap();
    let err = WarmupProbe::default()
        .run(&mut h.session, "answer", &[])
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::GuestTrapDuringBenchmark { ref entry, iteration: 0 } if entry == "answer"
    ));
}

#[test]
fn test_unknown_entry() {
    let mut h = harness(&RunConfig::default());
    h.session.load_stdlib().unwrap();

    let err = WarmupProbe::default().run(&mut h.session, "fib", &[]).unwrap_err();
    assert_eq!(err.phase(), "resolve");
}
