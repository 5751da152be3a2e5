use async_trait::async_trait;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{config::SandboxConfig, harness::Harness};

/// How a program run ended, as far as the backend can tell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunStatus {
    /// Ran to completion with a zero exit code. Output not compared yet.
    Finished,
    /// The backend compared the output itself and found it equal.
    Accepted,
    /// The backend compared the output itself and found it different.
    WrongAnswer,
    CompileError,
    RuntimeError(String),
    TimeLimitExceeded,
    OutputLimitExceeded,
    MemoryLimitExceeded,
    /// Interpreter or compiler is not installed on this host.
    ToolMissing(String),
    /// Any other verdict reported by a remote judge, by its description.
    Other(String),
}

impl RunStatus {
    /// Whether the program itself ran cleanly.
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Finished | RunStatus::Accepted)
    }

    pub fn describe(&self) -> String {
        match self {
            RunStatus::Finished | RunStatus::Accepted => "Accepted".into(),
            RunStatus::WrongAnswer => "Wrong Answer".into(),
            RunStatus::CompileError => "Compilation Error".into(),
            RunStatus::RuntimeError(detail) if detail.is_empty() => "Runtime Error".into(),
            RunStatus::RuntimeError(detail) => format!("Runtime Error ({})", detail),
            RunStatus::TimeLimitExceeded => "Time Limit Exceeded".into(),
            RunStatus::OutputLimitExceeded => "Output Limit Exceeded".into(),
            RunStatus::MemoryLimitExceeded => "Memory Limit Exceeded".into(),
            RunStatus::ToolMissing(_) => "Tool Missing".into(),
            RunStatus::Other(desc) => desc.clone(),
        }
    }
}

/// The result returned by running a harnessed program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutput {
    pub status: RunStatus,
    pub stdout: String,
    pub stderr: String,
    /// Compiler diagnostics, with scratch paths stripped.
    pub compile_output: String,
    /// Exit code of the program, when it exited on its own.
    pub exit_code: Option<i32>,
    pub time_ms: Option<f64>,
    pub memory_kb: Option<u64>,
}

impl RunOutput {
    pub fn with_status(status: RunStatus) -> RunOutput {
        RunOutput {
            status,
            stdout: String::new(),
            stderr: String::new(),
            compile_output: String::new(),
            exit_code: None,
            time_ms: None,
            memory_kb: None,
        }
    }
}

/// Something that can run a harnessed program against its stdin.
///
/// Verdict-level failures (compile error, timeout...) are reported inside
/// [`RunOutput`]; `Err(_)` is reserved for infrastructure failures.
#[async_trait]
pub trait Executor: Send + Sync {
    /// The name of this backend, used in logs
    fn name(&self) -> std::borrow::Cow<'static, str>;

    /// Run `harness`. `expected` may be handed to backends that compare
    /// output themselves.
    async fn execute(&self, harness: &Harness, expected: Option<&str>)
        -> anyhow::Result<RunOutput>;
}

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct CommandRunOptions {
    #[builder(default = "1024*1024")]
    pub output_limit: usize,

    #[builder(default = "Duration::from_secs(5)")]
    pub timeout: Duration,

    #[builder(default = "Duration::from_secs(15)")]
    pub compile_timeout: Duration,
}

impl From<&SandboxConfig> for CommandRunOptions {
    fn from(cfg: &SandboxConfig) -> Self {
        CommandRunOptions {
            output_limit: cfg.output_limit_bytes,
            timeout: Duration::from_millis(cfg.timeout_ms),
            compile_timeout: Duration::from_millis(cfg.compile_timeout_ms),
        }
    }
}
