//! 日志记录

use std::fmt;

/// 日志级别，从最详细到最严重
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    const ALL: [Level; 5] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    pub(crate) const fn rank(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(rank as usize).copied()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 一条宿主日志
///
/// `target` 是稳定的子系统名（`wasche::core`、`wasche::linker`、
/// `wasche::session`），未指定时为调用处的模块路径。
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Unix 毫秒
    pub timestamp_ms: u64,
    pub level: Level,
    pub target: &'static str,
    pub message: String,
}

impl Record {
    pub fn new(level: Level, target: &'static str, message: impl Into<String>) -> Self {
        Record {
            timestamp_ms: crate::unix_millis(),
            level,
            target,
            message: message.into(),
        }
    }
}

/// `HH:MM:SS.mmm LEVEL target: message`（UTC）
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.timestamp_ms / 1000;
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03} {:<5} {}: {}",
            secs / 3600 % 24,
            secs / 60 % 60,
            secs % 60,
            self.timestamp_ms % 1000,
            self.level,
            self.target,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_round_trip() {
        for level in Level::ALL {
            assert_eq!(Level::from_rank(level.rank()), Some(level));
        }
        assert_eq!(Level::from_rank(5), None);
    }

    #[test]
    fn test_level_honours_width() {
        assert_eq!(format!("[{:<5}]", Level::Info), "[INFO ]");
        assert_eq!(format!("[{:>5}]", Level::Warn), "[ WARN]");
        assert_eq!(format!("[{:<5}]", Level::Error), "[ERROR]");
    }

    #[test]
    fn test_new_record_is_stamped() {
        let record = Record::new(Level::Debug, "wasche::linker", "module #0 linked");
        assert_eq!(record.target, "wasche::linker");
        assert!(record.timestamp_ms > 0);
    }

    #[test]
    fn test_display() {
        let record = Record {
            timestamp_ms: (13 * 3600 + 7 * 60 + 9) * 1000 + 42,
            level: Level::Warn,
            target: "wasche::session",
            message: "guest error absorbed".into(),
        };
        assert_eq!(
            record.to_string(),
            "13:07:09.042 WARN  wasche::session: guest error absorbed"
        );
    }
}
