//! 快照驱动端到端测试

mod common;

use common::*;
use std::path::{Path, PathBuf};
use wasche_api::{
    collect_fixtures, compile, run_fixture, run_suite, CompilerConfig, RunConfig, SnapshotMode,
    SnapshotStore,
};

#[test]
fn test_collect_program_fixtures() {
    let fixtures = collect_fixtures(&programs_dir()).unwrap();
    assert_eq!(
        fixtures,
        vec![
            PathBuf::from("nested/answer.scm"),
            PathBuf::from("print.scm"),
            PathBuf::from("raise.scm"),
        ]
    );
}

#[test]
fn test_run_fixture() {
    let core = compile(MOCK_CORE).unwrap();
    let output = run_fixture(&core, &program("raise.scm"), &RunConfig::default()).unwrap();

    assert_eq!(output.exit_code, 1);
    assert_eq!(output.stdout, "1\n");
    assert_eq!(output.stderr, "raised\n");
}

#[test]
fn test_fixture_output_is_independent_of_variant() {
    let core = compile(MOCK_CORE).unwrap();
    let src = program("print.scm");

    let outputs: Vec<_> = CompilerConfig::snapshot_variants()
        .iter()
        .map(|variant| {
            let config = RunConfig::default().with_compiler(*variant);
            run_fixture(&core, &src, &config).unwrap()
        })
        .collect();
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_suite_creates_then_matches() {
    let dir = temp_dir("suite");
    let core = compile(MOCK_CORE).unwrap();
    let variants = CompilerConfig::snapshot_variants();
    let config = RunConfig::default();

    let store = SnapshotStore::new(&dir, SnapshotMode::Compare);
    let first = run_suite(&core, &programs_dir(), &store, &variants, &config).unwrap();
    assert_eq!(first.fixtures, 3);
    assert_eq!(first.variants, 3);
    assert_eq!(first.created, 3 * 3 * 3);
    assert!(first.passed());

    let second = run_suite(&core, &programs_dir(), &store, &variants, &config).unwrap();
    assert_eq!(second.matched, 27);
    assert!(second.passed());

    let exit_code = dir.join("enableJit=false").join("raise.scm-exitCode");
    assert_eq!(std::fs::read_to_string(&exit_code).unwrap(), "1");

    // 篡改一个快照后比较失败
    std::fs::write(dir.join("default").join("print.scm-stdout"), "8\n").unwrap();
    let third = run_suite(&core, &programs_dir(), &store, &variants, &config).unwrap();
    assert!(!third.passed());
    assert_eq!(third.mismatches.len(), 1);
    assert!(third.mismatches[0].path.ends_with(Path::new("default/print.scm-stdout")));

    let update = SnapshotStore::new(&dir, SnapshotMode::Update);
    let fourth = run_suite(&core, &programs_dir(), &update, &variants, &config).unwrap();
    assert_eq!(fourth.updated, 1);
    assert!(fourth.passed());

    let _ = std::fs::remove_dir_all(&dir);
}

/// 需要真实核心：两个基准脚本在关闭 JIT 时都正常结束
#[test]
fn test_baseline_liveness_with_real_core() {
    let Some(bytes) = real_core() else {
        return;
    };
    let core = compile(bytes).unwrap();
    let scheme_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../fixtures/scheme");
    let config = RunConfig::default().with_compiler(CompilerConfig::default().with(
        wasche_api::CompilerFlag::EnableJit,
        false,
    ));

    for name in ["tak.b.scm", "div2.b.scm"] {
        let src = std::fs::read(scheme_dir.join(name)).unwrap();
        let output = run_fixture(&core, &src, &config).unwrap();
        assert_eq!(output.exit_code, 0, "{name}: {}", output.stderr);
    }
}
