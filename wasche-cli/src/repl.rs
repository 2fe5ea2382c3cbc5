//! 交互式 REPL
//!
//! 单消费者的阻塞循环：每行输入是一个块，完整地编译、链接、运行、回显
//! 之后才读下一行。访客错误不会退出。

use std::io::{self, BufRead, Write};
use wasche_api::{ApiError, RunConfig, RuntimeEnv, Session, SessionOptions};

pub const REPL_RUNTIME_NAME: &str = "repl.scm";

const PROMPT: &str = "=> ";

fn prompt(out: &mut impl Write, text: &str) -> Result<(), ApiError> {
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| ApiError::Io {
            path: "<stdout>".into(),
            source: e,
        })
}

pub fn run(core_bytes: &[u8], config: RunConfig) -> Result<(), ApiError> {
    let config = config
        .with_session(SessionOptions::repl())
        .with_runtime_name(REPL_RUNTIME_NAME);
    let mut session = Session::new(core_bytes, RuntimeEnv::process(), &config)?;

    let mut stdout = io::stdout();
    prompt(&mut stdout, &format!("{PROMPT}<eval stdlib>\n"))?;
    session.load_stdlib()?;
    session.flush_all()?;

    prompt(&mut stdout, PROMPT)?;
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| ApiError::Io {
            path: "<stdin>".into(),
            source: e,
        })?;
        session.load_src(line.as_bytes())?;
        session.flush_all()?;
        prompt(&mut stdout, PROMPT)?;
    }

    session.cleanup()
}
