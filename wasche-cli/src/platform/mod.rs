//! 平台相关的输出

pub mod cli;

pub use cli::{print_error, print_snapshot_summary, print_warmup_report};
