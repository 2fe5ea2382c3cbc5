//! 会话：执行入口与错误桥
//!
//! 每个入口调用的访客异常在这里统一处理：`exit_on_exception` 时调用退出
//! 回调（退出码 1），否则吸收掉，会话继续。宿主故障一律以 [`ApiError`] 返回。

use crate::config::RunConfig;
use crate::env::{ExitFn, RuntimeEnv};
use crate::error::ApiResult;
use std::sync::Arc;
use wasche_config::Phase;
use wasche_core::{CoreError, Extern, LinkError, Module, Outcome, RuntimeCore, SchemeValue, STDOUT_FD};
use wasche_log::{debug, info, warn, Logger};

const TARGET: &str = Phase::Session.target();

/// 访客错误的退出码
pub const GUEST_ERROR_EXIT_CODE: i32 = 1;

pub struct Session {
    core: RuntimeCore,
    exit: ExitFn,
    logger: Arc<Logger>,
    guest_traps: usize,
}

impl Session {
    /// 加载核心、应用编译开关、调用 `init`
    pub fn new(core_bytes: impl AsRef<[u8]>, env: RuntimeEnv, config: &RunConfig) -> ApiResult<Self> {
        let module = wasche_core::compile(core_bytes)?;
        Self::from_module(&module, env, config)
    }

    /// 复用已编译的核心模块，每次都得到全新的核心实例
    pub fn from_module(module: &Module, env: RuntimeEnv, config: &RunConfig) -> ApiResult<Self> {
        let log = config.session_log()?;
        let mut core = RuntimeCore::from_module(module, env.output, log, config.session)?;
        core.configure(&config.compiler)?;
        core.init()?;
        info!(config.logger, target: TARGET, "session ready ({})", config.compiler.label());
        Ok(Session {
            core,
            exit: env.exit,
            logger: config.logger.clone(),
            guest_traps: 0,
        })
    }

    /// 错误桥
    fn bridge(&mut self, op: &str, outcome: Outcome<()>) -> ApiResult<()> {
        let Outcome::GuestTrap(trap) = outcome else {
            return Ok(());
        };
        self.guest_traps += 1;
        if self.core.options().exit_on_exception {
            debug!(self.logger, target: TARGET, "{op}: guest error, exiting with {GUEST_ERROR_EXIT_CODE}");
            // 进程退出前把已经写出的输出刷干净；刷新失败也照样退出
            let flushed = self.flush_output();
            (self.exit)(GUEST_ERROR_EXIT_CODE);
            flushed?;
        } else {
            warn!(
                self.logger,
                target: TARGET,
                "{op}: guest error absorbed (link {:?})",
                trap.during_link
            );
        }
        Ok(())
    }

    fn flush_output(&mut self) -> ApiResult<()> {
        self.core
            .flush_output()
            .map_err(|source| CoreError::from(LinkError::Output { fd: STDOUT_FD, source }))?;
        Ok(())
    }

    pub fn load_stdlib(&mut self) -> ApiResult<()> {
        let outcome = self.core.load_stdlib()?;
        self.bridge("load_stdlib", outcome)
    }

    pub fn load_src(&mut self, src: &[u8]) -> ApiResult<()> {
        debug!(self.logger, target: TARGET, "load_src: {} bytes", src.len());
        let outcome = self.core.load_src(src)?;
        self.bridge("load_src", outcome)
    }

    pub fn flush_all(&mut self) -> ApiResult<()> {
        let outcome = self.core.flush_all()?;
        self.bridge("flush_all", outcome)
    }

    /// 结束会话；消费 `self`，所以只能调用一次
    pub fn cleanup(mut self) -> ApiResult<()> {
        let outcome = self.core.cleanup()?;
        self.bridge("cleanup", outcome)?;
        self.flush_output()?;
        info!(
            self.logger,
            target: TARGET,
            "session finished: {} link events, {} guest errors",
            self.core.links().get(),
            self.guest_traps
        );
        Ok(())
    }

    pub fn resolve_global(&mut self, name: &str) -> ApiResult<Extern> {
        Ok(self.core.resolve_global(name)?)
    }

    /// 调用已链接的过程；访客错误原样作为 [`Outcome::GuestTrap`] 返回，不触发退出
    pub fn call_global(&mut self, name: &str, args: &[SchemeValue]) -> ApiResult<Outcome<SchemeValue>> {
        Ok(self.core.call_global(name, args)?)
    }

    /// 诊断文本；读到核心内存之外时给出错误描述而不是失败
    pub fn describe(&self, value: SchemeValue) -> String {
        match self.core.describe(value) {
            Ok(text) => text,
            Err(e) => format!("#<{e}>"),
        }
    }

    pub fn links_observed(&self) -> u64 {
        self.core.links().get()
    }

    pub fn guest_traps(&self) -> usize {
        self.guest_traps
    }

    pub fn last_result(&self) -> Option<SchemeValue> {
        self.core.last_result()
    }

    pub fn core(&self) -> &RuntimeCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut RuntimeCore {
        &mut self.core
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("core", &self.core)
            .field("guest_traps", &self.guest_traps)
            .finish()
    }
}

/// 一次性执行：`load_stdlib` → `load_src` → `cleanup`
pub fn run_script(
    core_bytes: impl AsRef<[u8]>,
    src: &[u8],
    env: RuntimeEnv,
    config: &RunConfig,
) -> ApiResult<()> {
    let mut session = Session::new(core_bytes, env, config)?;
    session.load_stdlib()?;
    session.load_src(src)?;
    session.cleanup()
}
