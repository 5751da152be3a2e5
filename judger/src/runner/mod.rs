//! Execution backends.
//!
//! Both backends implement [`Executor`]; which one runs a request is decided
//! by [`crate::evaluator`]. Interpreting results against test cases is done in
//! [`crate::tester`].

pub mod local;
pub mod model;
pub mod queue;
pub mod remote;
pub mod retry;
mod util;

pub use local::LocalSandboxExecutor;
pub use model::{CommandRunOptions, Executor, RunOutput, RunStatus};
pub use queue::SubmissionQueue;
pub use remote::{JudgeError, RemoteJudgeClient, RemoteJudgeExecutor};
pub use retry::RetryPolicy;
