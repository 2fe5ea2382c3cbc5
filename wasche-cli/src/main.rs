//! Wasche CLI - Command line interface
//!
//! 子命令：`run`、`run-aot`、`repl`、`snapshot`、`warmup`。
//! 宿主故障打印 `error[<phase>]: <message>` 并以 2 退出；
//! 访客错误在 `run` 中以 1 退出。

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;

mod config;
mod logging;
mod platform;
mod repl;

use crate::config::LogConfig;
use crate::logging::LogFormat;
use wasche_api::{
    compile, run_suite, AotProgram, ApiError, CompilerConfig, CompilerFlag, FileConfig, RunConfig,
    RuntimeEnv, Session, SnapshotMode, SnapshotStore, WarmupProbe,
};
use wasche_config::{LogLevel, Phase, LOG_DIR_ENV, RUNTIME_ENV};
use wasche_log::info;

/// 宿主故障的退出码
const HOST_FAULT_EXIT_CODE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "wasche",
    about = "Host runtime for the JIT-compiling Scheme core",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Global log level (overrides -v): off, error, warn, info, debug, trace
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Per-subsystem log level, e.g. `--log linker=trace`
    #[arg(long = "log", global = true, value_name = "TARGET=LEVEL")]
    log_targets: Vec<String>,

    #[arg(long, value_enum, default_value = "compact", global = true)]
    log_format: LogFormat,

    /// Directory receiving every linked module, its IR and the core log (default: $LOG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Runtime core binary (default: $WASCHE_RUNTIME)
    #[arg(long, global = true, value_name = "WASM")]
    runtime: Option<PathBuf>,

    /// JSON config file with `compiler` and `session` sections
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Force the JIT on
    #[arg(long, global = true, conflicts_with = "no_jit")]
    jit: bool,

    /// Force the JIT off
    #[arg(long, global = true)]
    no_jit: bool,

    /// Disable JIT optimization passes
    #[arg(long, global = true)]
    no_jit_optimization: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Scheme source file
    Run {
        file: PathBuf,
        /// Skip loading the standard library
        #[arg(long)]
        no_stdlib: bool,
    },
    /// Run an ahead-of-time compiled module
    RunAot { wasm: PathBuf },
    /// Interactive read-eval-print loop
    Repl,
    /// Run every fixture under each compiler config and compare snapshots
    Snapshot {
        fixtures: PathBuf,
        snapshots: PathBuf,
        /// Overwrite snapshots instead of comparing
        #[arg(long)]
        update: bool,
    },
    /// Check that a compiled procedure stops re-linking after warm-up
    Warmup {
        file: PathBuf,
        /// Name of the zero-argument procedure to call
        entry: String,
        #[arg(long, default_value_t = wasche_api::bench::DEFAULT_WARMUP)]
        warmup: usize,
        #[arg(long, default_value_t = wasche_api::bench::DEFAULT_MEASURED)]
        measured: usize,
    },
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("no runtime core given; pass --runtime or set {RUNTIME_ENV}")]
    MissingRuntime,

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    pub fn phase(&self) -> &'static str {
        match self {
            CliError::Api(e) => e.phase(),
            CliError::MissingRuntime => "load",
            CliError::Usage(_) => "usage",
        }
    }
}

impl From<wasche_api::CoreError> for CliError {
    fn from(e: wasche_api::CoreError) -> Self {
        CliError::Api(e.into())
    }
}

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            platform::print_error(&e);
            HOST_FAULT_EXIT_CODE
        }
    };
    process::exit(code);
}

fn log_config(cli: &Cli) -> Result<LogConfig, CliError> {
    let mut log_config = LogConfig::from_verbosity(cli.verbose);
    if let Some(level) = &cli.log_level {
        log_config.global = LogLevel::parse(level)
            .ok_or_else(|| CliError::Usage(format!("unknown log level `{level}`")))?;
    }
    for directive in &cli.log_targets {
        log_config.apply_override(directive).map_err(CliError::Usage)?;
    }
    Ok(log_config)
}

/// 配置文件 → 命令行开关 → 环境变量
fn run_config(cli: &Cli, log_config: &LogConfig) -> Result<RunConfig, CliError> {
    let mut config = RunConfig::default().with_logger(logging::logger(log_config));
    if let Some(path) = &cli.config {
        config = FileConfig::load(path)?.apply(config);
    }

    let mut compiler: CompilerConfig = config.compiler;
    if cli.jit {
        compiler = compiler.with(CompilerFlag::EnableJit, true);
    }
    if cli.no_jit {
        compiler = compiler.with(CompilerFlag::EnableJit, false);
    }
    if cli.no_jit_optimization {
        compiler = compiler.with(CompilerFlag::EnableJitOptimization, false);
    }
    config.compiler = compiler;

    config.log_dir = cli
        .log_dir
        .clone()
        .or_else(|| std::env::var_os(LOG_DIR_ENV).map(PathBuf::from));
    Ok(config)
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| {
        CliError::Api(ApiError::Io {
            path: path.to_path_buf(),
            source,
        })
    })
}

fn runtime_bytes(cli: &Cli) -> Result<Vec<u8>, CliError> {
    let path = cli
        .runtime
        .clone()
        .or_else(|| std::env::var_os(RUNTIME_ENV).map(PathBuf::from))
        .ok_or(CliError::MissingRuntime)?;
    read(&path)
}

fn run(cli: Cli) -> Result<i32, CliError> {
    let log_config = log_config(&cli)?;
    logging::init(&log_config, cli.log_format);
    let config = run_config(&cli, &log_config)?;
    info!(config.logger, target: Phase::Session.target(), "{config:?}");

    match &cli.command {
        Command::Run { file, no_stdlib } => {
            let core = runtime_bytes(&cli)?;
            let src = read(file)?;
            let config = config.with_runtime_name(file.to_string_lossy());
            // 访客错误时退出回调直接以 1 结束进程
            let mut session = Session::new(core, RuntimeEnv::process(), &config)?;
            if !no_stdlib {
                session.load_stdlib()?;
            }
            session.load_src(&src)?;
            session.cleanup()?;
            Ok(0)
        }
        Command::RunAot { wasm } => {
            let bytes = read(wasm)?;
            let config = config.with_runtime_name(wasm.to_string_lossy());
            let log = config.session_log()?;
            let mut program = AotProgram::load(bytes, Box::new(wasche_api::wasche_core::ProcessOutput), log)?;
            program.run()?;
            Ok(0)
        }
        Command::Repl => {
            let core = runtime_bytes(&cli)?;
            repl::run(&core, config)?;
            Ok(0)
        }
        Command::Snapshot {
            fixtures,
            snapshots,
            update,
        } => {
            let core = compile(runtime_bytes(&cli)?)?;
            let mode = if *update {
                SnapshotMode::Update
            } else {
                SnapshotMode::Compare
            };
            let store = SnapshotStore::new(snapshots, mode);
            let summary = run_suite(
                &core,
                fixtures,
                &store,
                &CompilerConfig::snapshot_variants(),
                &config,
            )?;
            platform::print_snapshot_summary(&summary);
            Ok(if summary.passed() { 0 } else { 1 })
        }
        Command::Warmup {
            file,
            entry,
            warmup,
            measured,
        } => {
            let core = runtime_bytes(&cli)?;
            let src = read(file)?;
            let config = config.with_runtime_name(file.to_string_lossy());
            let mut session = Session::new(core, RuntimeEnv::process(), &config)?;
            session.load_stdlib()?;
            session.load_src(&src)?;
            let report = WarmupProbe::new(*warmup, *measured).run(&mut session, entry, &[])?;
            platform::print_warmup_report(&report);
            session.cleanup()?;
            Ok(0)
        }
    }
}
