//! JIT 预热稳定性探针
//!
//! 先调用入口 `warmup` 次，然后在 `measured` 次调用的测量窗口内
//! 要求不再出现任何链接事件：窗口内的重新编译会让计时失真。

use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use std::time::{Duration, Instant};
use wasche_config::Phase;
use wasche_core::{Outcome, SchemeValue};
use wasche_log::{debug, info};

const TARGET: &str = Phase::Session.target();

pub const DEFAULT_WARMUP: usize = 30;
pub const DEFAULT_MEASURED: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupProbe {
    pub warmup: usize,
    pub measured: usize,
}

impl Default for WarmupProbe {
    fn default() -> Self {
        WarmupProbe {
            warmup: DEFAULT_WARMUP,
            measured: DEFAULT_MEASURED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarmupReport {
    pub entry: String,
    /// 预热阶段观察到的链接事件数
    pub warmup_links: u64,
    pub measured: usize,
    pub elapsed: Duration,
    pub last_result: SchemeValue,
}

impl WarmupReport {
    pub fn per_call(&self) -> Duration {
        match u32::try_from(self.measured) {
            Ok(n) if n > 0 => self.elapsed / n,
            _ => Duration::ZERO,
        }
    }
}

impl WarmupProbe {
    pub fn new(warmup: usize, measured: usize) -> Self {
        WarmupProbe { warmup, measured }
    }

    /// 对已链接的过程 `entry` 运行探针
    pub fn run(&self, session: &mut Session, entry: &str, args: &[SchemeValue]) -> ApiResult<WarmupReport> {
        let closure = session.core_mut().closure(entry)?;
        let logger = session.core().session_log().logger().clone();

        let start_links = session.links_observed();
        let mut last_result = SchemeValue::UNIT;
        for iteration in 0..self.warmup {
            last_result = self.call(session, entry, closure, args, iteration)?;
        }
        let warm_links = session.links_observed();
        debug!(
            logger,
            target: TARGET,
            "{entry}: {} link events during {} warm-up calls",
            warm_links - start_links,
            self.warmup
        );

        let started = Instant::now();
        for iteration in self.warmup..self.warmup + self.measured {
            last_result = self.call(session, entry, closure, args, iteration)?;
        }
        let elapsed = started.elapsed();

        let extra_links = session.links_observed() - warm_links;
        if extra_links > 0 {
            return Err(ApiError::RelinkDuringMeasurement {
                warmup: self.warmup,
                extra_links,
            });
        }

        let report = WarmupReport {
            entry: entry.to_string(),
            warmup_links: warm_links - start_links,
            measured: self.measured,
            elapsed,
            last_result,
        };
        info!(
            logger,
            target: TARGET,
            "{entry}: {} calls in {:?} ({:?}/call)",
            self.measured,
            report.elapsed,
            report.per_call()
        );
        Ok(report)
    }

    fn call(
        &self,
        session: &mut Session,
        entry: &str,
        closure: SchemeValue,
        args: &[SchemeValue],
        iteration: usize,
    ) -> ApiResult<SchemeValue> {
        match session.core_mut().call_closure(closure, args)? {
            Outcome::Completed(value) => Ok(value),
            Outcome::GuestTrap(_) => Err(ApiError::GuestTrapDuringBenchmark {
                entry: entry.to_string(),
                iteration,
            }),
        }
    }
}
