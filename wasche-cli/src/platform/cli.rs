//! CLI 格式化输出
//!
//! 宿主故障、快照差异和基准报告都写 stderr；stdout 只留给访客程序。

use crate::CliError;
use wasche_api::{SnapshotStatus, SnapshotSummary, WarmupReport};

/// `error[<phase>]: <message>`，附带错误链
pub fn print_error(e: &CliError) {
    eprintln!("error[{}]: {}", e.phase(), e);
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

pub fn print_snapshot_summary(summary: &SnapshotSummary) {
    for entry in &summary.mismatches {
        if let SnapshotStatus::Mismatch { expected, actual } = &entry.status {
            eprintln!("mismatch: {}", entry.path.display());
            eprintln!("--- expected");
            eprint!("{}", with_trailing_newline(expected));
            eprintln!("+++ actual");
            eprint!("{}", with_trailing_newline(actual));
        }
    }
    eprintln!(
        "{} fixture(s) x {} variant(s): {} matched, {} created, {} updated, {} mismatched",
        summary.fixtures,
        summary.variants,
        summary.matched,
        summary.created,
        summary.updated,
        summary.mismatches.len()
    );
}

pub fn print_warmup_report(report: &WarmupReport) {
    eprintln!(
        "{}: {} link event(s) during warm-up, {} calls in {:?} ({:?}/call)",
        report.entry,
        report.warmup_links,
        report.measured,
        report.elapsed,
        report.per_call()
    );
}

fn with_trailing_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_trailing_newline() {
        assert_eq!(with_trailing_newline("0"), "0\n");
        assert_eq!(with_trailing_newline("42\n"), "42\n");
        assert_eq!(with_trailing_newline(""), "");
    }
}
