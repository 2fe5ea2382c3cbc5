//! 会话的外部环境：退出回调和程序输出

use std::cell::RefCell;
use std::rc::Rc;
use wasche_core::{CapturedOutput, NullOutput, OutputSink, ProcessOutput};

/// 访客错误时调用的退出回调
pub type ExitFn = Box<dyn FnMut(i32)>;

pub struct RuntimeEnv {
    pub exit: ExitFn,
    pub output: Box<dyn OutputSink>,
}

impl RuntimeEnv {
    pub fn new(exit: ExitFn, output: Box<dyn OutputSink>) -> Self {
        RuntimeEnv { exit, output }
    }

    /// 真实进程：输出到 stdout / stderr，退出即结束进程
    pub fn process() -> Self {
        RuntimeEnv::new(Box::new(|code| std::process::exit(code)), Box::new(ProcessOutput))
    }

    /// 捕获输出和退出码，供快照测试和嵌入方使用
    pub fn captured() -> (Self, CapturedOutput, ExitRecorder) {
        let output = CapturedOutput::new();
        let exits = ExitRecorder::default();
        let env = RuntimeEnv::new(Box::new(exits.callback()), Box::new(output.clone()));
        (env, output, exits)
    }

    /// 丢弃输出，忽略退出；基准测试用
    pub fn null() -> Self {
        RuntimeEnv::new(Box::new(|_| {}), Box::new(NullOutput))
    }
}

impl std::fmt::Debug for RuntimeEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeEnv").finish_non_exhaustive()
    }
}

/// 记录每次退出回调
#[derive(Clone, Debug, Default)]
pub struct ExitRecorder {
    calls: Rc<RefCell<Vec<i32>>>,
}

impl ExitRecorder {
    fn callback(&self) -> impl FnMut(i32) + 'static {
        let calls = self.calls.clone();
        move |code| calls.borrow_mut().push(code)
    }

    pub fn calls(&self) -> Vec<i32> {
        self.calls.borrow().clone()
    }

    /// 最后一次退出码；从未调用时为 0
    pub fn exit_code(&self) -> i32 {
        self.calls.borrow().last().copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_recorder() {
        let (mut env, _output, exits) = RuntimeEnv::captured();
        assert_eq!(exits.exit_code(), 0);

        (env.exit)(1);
        assert_eq!(exits.calls(), vec![1]);
        assert_eq!(exits.exit_code(), 1);
    }

    #[test]
    fn test_captured_output_is_shared() {
        let (mut env, output, _exits) = RuntimeEnv::captured();
        env.output.write_buf(1, b"hi").unwrap();
        env.output.write_buf(2, b"oops").unwrap();
        assert_eq!(output.stdout_string(), "hi");
        assert_eq!(output.stderr_string(), "oops");
    }
}
