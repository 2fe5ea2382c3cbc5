//! 端到端快照驱动
//!
//! 每个 `.scm` fixture 在每个编译配置下各跑一次全新会话
//! （`load_stdlib` → `load_src` → `cleanup`），退出码、stdout、stderr
//! 分别与 `<dir>/<label>/<fixture>-exitCode|-stdout|-stderr` 比较。

use crate::config::RunConfig;
use crate::env::RuntimeEnv;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use std::path::{Path, PathBuf};
use wasche_config::{CompilerConfig, Phase, SessionOptions};
use wasche_core::Module;
use wasche_log::{debug, info};

const TARGET: &str = Phase::Session.target();

pub const FIXTURE_EXTENSION: &str = ".scm";

/// 递归收集 fixture，返回相对 `dir` 的路径（排序）；跳过以 `.` 开头的条目
pub fn collect_fixtures(dir: &Path) -> ApiResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect_into(dir, Path::new(""), &mut found)?;
    found.sort();
    Ok(found)
}

fn collect_into(base: &Path, rel: &Path, found: &mut Vec<PathBuf>) -> ApiResult<()> {
    let dir = base.join(rel);
    let entries = std::fs::read_dir(&dir).map_err(|e| ApiError::io(&dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ApiError::io(&dir, e))?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = rel.join(&name);
        let file_type = entry.file_type().map_err(|e| ApiError::io(entry.path(), e))?;
        if file_type.is_dir() {
            collect_into(base, &path, found)?;
        } else if name.to_string_lossy().ends_with(FIXTURE_EXTENSION) {
            found.push(path);
        }
    }
    Ok(())
}

/// 一次 fixture 运行的可观察结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// 用全新会话运行一个 fixture；`config.session` 被忽略，总是按脚本模式运行
pub fn run_fixture(core: &Module, src: &[u8], config: &RunConfig) -> ApiResult<SnapshotOutput> {
    let (env, output, exits) = RuntimeEnv::captured();
    let config = config.clone().with_session(SessionOptions::script());

    let mut session = Session::from_module(core, env, &config)?;
    session.load_stdlib()?;
    session.load_src(src)?;
    session.cleanup()?;

    Ok(SnapshotOutput {
        exit_code: exits.exit_code(),
        stdout: output.stdout_string(),
        stderr: output.stderr_string(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotMode {
    /// 比较；缺失的快照会被写入
    Compare,
    /// 覆盖全部快照
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    Matched,
    Created,
    Updated,
    Mismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub path: PathBuf,
    pub status: SnapshotStatus,
}

/// 快照文件存储
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    mode: SnapshotMode,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>, mode: SnapshotMode) -> Self {
        SnapshotStore {
            dir: dir.into(),
            mode,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<label>/<fixture><suffix>`
    pub fn path(&self, label: &str, fixture: &Path, suffix: &str) -> ApiResult<PathBuf> {
        let name = fixture.to_str().ok_or_else(|| ApiError::FixtureName {
            path: fixture.to_path_buf(),
        })?;
        Ok(self.dir.join(label).join(format!("{name}{suffix}")))
    }

    /// 检查三个快照文件
    pub fn check(
        &self,
        label: &str,
        fixture: &Path,
        output: &SnapshotOutput,
    ) -> ApiResult<Vec<SnapshotEntry>> {
        let exit_code = output.exit_code.to_string();
        let files = [
            ("-exitCode", exit_code.as_str()),
            ("-stdout", output.stdout.as_str()),
            ("-stderr", output.stderr.as_str()),
        ];
        files
            .into_iter()
            .map(|(suffix, actual)| {
                let path = self.path(label, fixture, suffix)?;
                let status = self.check_file(&path, actual)?;
                Ok(SnapshotEntry { path, status })
            })
            .collect()
    }

    fn check_file(&self, path: &Path, actual: &str) -> ApiResult<SnapshotStatus> {
        let existing = match std::fs::read(path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(ApiError::io(path, e)),
        };
        match (self.mode, existing) {
            (SnapshotMode::Compare, Some(expected)) if expected == actual => Ok(SnapshotStatus::Matched),
            (SnapshotMode::Compare, Some(expected)) => Ok(SnapshotStatus::Mismatch {
                expected,
                actual: actual.to_string(),
            }),
            (SnapshotMode::Update, Some(expected)) if expected == actual => Ok(SnapshotStatus::Matched),
            (SnapshotMode::Update, Some(_)) => {
                write_snapshot(path, actual)?;
                Ok(SnapshotStatus::Updated)
            }
            (_, None) => {
                write_snapshot(path, actual)?;
                Ok(SnapshotStatus::Created)
            }
        }
    }
}

fn write_snapshot(path: &Path, contents: &str) -> ApiResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ApiError::io(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| ApiError::io(path, e))
}

/// 一次快照运行的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub fixtures: usize,
    pub variants: usize,
    pub matched: usize,
    pub created: usize,
    pub updated: usize,
    pub mismatches: Vec<SnapshotEntry>,
}

impl SnapshotSummary {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    fn record(&mut self, entry: SnapshotEntry) {
        match entry.status {
            SnapshotStatus::Matched => self.matched += 1,
            SnapshotStatus::Created => self.created += 1,
            SnapshotStatus::Updated => self.updated += 1,
            SnapshotStatus::Mismatch { .. } => self.mismatches.push(entry),
        }
    }
}

/// 对 `fixtures_dir` 下的每个 fixture、每个编译配置运行并检查快照
pub fn run_suite(
    core: &Module,
    fixtures_dir: &Path,
    store: &SnapshotStore,
    variants: &[CompilerConfig],
    config: &RunConfig,
) -> ApiResult<SnapshotSummary> {
    let fixtures = collect_fixtures(fixtures_dir)?;
    let mut summary = SnapshotSummary {
        fixtures: fixtures.len(),
        variants: variants.len(),
        ..SnapshotSummary::default()
    };

    for variant in variants {
        let label = variant.label();
        for fixture in &fixtures {
            let path = fixtures_dir.join(fixture);
            let src = std::fs::read(&path).map_err(|e| ApiError::io(&path, e))?;
            let name = fixture.to_string_lossy();
            let fixture_config = config
                .clone()
                .with_compiler(*variant)
                .with_runtime_name(name.to_string());

            let output = run_fixture(core, &src, &fixture_config)?;
            debug!(
                config.logger,
                target: TARGET,
                "{label} {name}: exit {}",
                output.exit_code
            );
            for entry in store.check(&label, fixture, &output)? {
                summary.record(entry);
            }
        }
    }

    info!(
        config.logger,
        target: TARGET,
        "snapshots: {} matched, {} created, {} updated, {} mismatched",
        summary.matched,
        summary.created,
        summary.updated,
        summary.mismatches.len()
    );
    Ok(summary)
}
