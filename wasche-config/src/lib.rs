//! Wasche Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Wasche crates.

use serde::{Deserialize, Serialize};

/// 运行时核心二进制路径的环境变量
pub const RUNTIME_ENV: &str = "WASCHE_RUNTIME";

/// 会话跟踪目录的环境变量
pub const LOG_DIR_ENV: &str = "LOG_DIR";

/// A single compiler feature flag understood by the runtime core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompilerFlag {
    EnableJit,
    EnableJitOptimization,
    EnableJitSmallBlockFusion,
    EnableJitLargeBlockFusion,
}

impl CompilerFlag {
    pub const ALL: [CompilerFlag; 4] = [
        CompilerFlag::EnableJit,
        CompilerFlag::EnableJitOptimization,
        CompilerFlag::EnableJitSmallBlockFusion,
        CompilerFlag::EnableJitLargeBlockFusion,
    ];

    /// Name of the core export that applies this flag.
    pub fn setter(&self) -> &'static str {
        match self {
            CompilerFlag::EnableJit => "set_config_enable_jit",
            CompilerFlag::EnableJitOptimization => "set_config_enable_jit_optimization",
            CompilerFlag::EnableJitSmallBlockFusion => "set_config_enable_jit_small_block_fusion",
            CompilerFlag::EnableJitLargeBlockFusion => "set_config_enable_jit_large_block_fusion",
        }
    }

    /// camelCase key, shared by JSON config files and variant labels.
    pub fn key(&self) -> &'static str {
        match self {
            CompilerFlag::EnableJit => "enableJit",
            CompilerFlag::EnableJitOptimization => "enableJitOptimization",
            CompilerFlag::EnableJitSmallBlockFusion => "enableJitSmallBlockFusion",
            CompilerFlag::EnableJitLargeBlockFusion => "enableJitLargeBlockFusion",
        }
    }
}

/// Compiler feature flags applied to the runtime core before `init`.
///
/// Only flags that are `Some` are sent to the core; the rest keep the
/// core's built-in defaults. Immutable for the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompilerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_jit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_jit_optimization: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_jit_small_block_fusion: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_jit_large_block_fusion: Option<bool>,
}

impl CompilerConfig {
    pub fn get(&self, flag: CompilerFlag) -> Option<bool> {
        match flag {
            CompilerFlag::EnableJit => self.enable_jit,
            CompilerFlag::EnableJitOptimization => self.enable_jit_optimization,
            CompilerFlag::EnableJitSmallBlockFusion => self.enable_jit_small_block_fusion,
            CompilerFlag::EnableJitLargeBlockFusion => self.enable_jit_large_block_fusion,
        }
    }

    pub fn set(&mut self, flag: CompilerFlag, value: Option<bool>) {
        let slot = match flag {
            CompilerFlag::EnableJit => &mut self.enable_jit,
            CompilerFlag::EnableJitOptimization => &mut self.enable_jit_optimization,
            CompilerFlag::EnableJitSmallBlockFusion => &mut self.enable_jit_small_block_fusion,
            CompilerFlag::EnableJitLargeBlockFusion => &mut self.enable_jit_large_block_fusion,
        };
        *slot = value;
    }

    pub fn with(mut self, flag: CompilerFlag, value: bool) -> Self {
        self.set(flag, Some(value));
        self
    }

    /// Defined flags in a fixed order.
    pub fn defined_flags(&self) -> impl Iterator<Item = (CompilerFlag, bool)> + '_ {
        CompilerFlag::ALL
            .into_iter()
            .filter_map(|flag| self.get(flag).map(|value| (flag, value)))
    }

    /// Stable label for snapshot directories and benchmark case names.
    pub fn label(&self) -> String {
        let parts: Vec<String> = self
            .defined_flags()
            .map(|(flag, value)| format!("{}={}", flag.key(), value))
            .collect();
        if parts.is_empty() {
            "default".to_string()
        } else {
            parts.join(",")
        }
    }

    /// 端到端快照测试使用的配置变体
    pub fn snapshot_variants() -> Vec<CompilerConfig> {
        vec![
            CompilerConfig::default(),
            CompilerConfig::default().with(CompilerFlag::EnableJitOptimization, false),
            CompilerConfig::default().with(CompilerFlag::EnableJit, false),
        ]
    }

    /// 基准测试使用的配置变体
    pub fn benchmark_variants() -> Vec<CompilerConfig> {
        vec![
            CompilerConfig::default().with(CompilerFlag::EnableJit, true),
            CompilerConfig::default().with(CompilerFlag::EnableJit, false),
        ]
    }
}

/// How a session reacts to guest runtime errors and evaluation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionOptions {
    /// Call the exit callback with code 1 on a guest error (one-shot scripts).
    pub exit_on_exception: bool,
    /// Echo each interactive unit's value through `write`/`newline` (REPL).
    pub echo_results: bool,
}

impl SessionOptions {
    pub const fn script() -> Self {
        Self {
            exit_on_exception: true,
            echo_results: false,
        }
    }

    pub const fn repl() -> Self {
        Self {
            exit_on_exception: false,
            echo_results: true,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::script()
    }
}

/// Log level shared by the CLI and configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "silent" => Some(LogLevel::Off),
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Warn
    }
}

/// Host subsystem, used to derive log targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Core,
    Linker,
    Session,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Core => "core",
            Phase::Linker => "linker",
            Phase::Session => "session",
        }
    }

    /// Get the log target name for this phase
    pub const fn target(&self) -> &'static str {
        match self {
            Phase::Core => "wasche::core",
            Phase::Linker => "wasche::linker",
            Phase::Session => "wasche::session",
        }
    }
}
