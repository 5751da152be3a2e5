//! Decides which test cases run, in what order, and when to stop.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing_futures::Instrument;

use super::utils::{compare_output, normalize_output};
use crate::{
    harness::build_harness,
    model::{EvaluateRequest, ExecutionResult, Mode, TestCase},
    runner::{Executor, RunOutput, RunStatus},
};

/// Status of a result whose backend failed before producing a verdict.
pub const EXECUTION_ERROR: &str = "Execution Error";

/// Drives one [`EvaluateRequest`] through an [`Executor`].
///
/// Results come back with public tests first, then hidden tests, each group
/// in original index order. Tests that were never executed are left out.
#[derive(Clone)]
pub struct TestScheduler {
    executor: Arc<dyn Executor>,
}

impl TestScheduler {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        TestScheduler { executor }
    }

    pub async fn schedule(&self, req: &EvaluateRequest) -> Vec<ExecutionResult> {
        let (public, hidden): (Vec<_>, Vec<_>) = req
            .test_cases
            .iter()
            .enumerate()
            .partition(|(_, case)| !case.is_hidden);

        match req.mode {
            Mode::Run => {
                let mut results = self.fan_out(req, &public).await;
                results.extend(self.fan_out(req, &hidden).await);
                results
            }
            Mode::Submit => self.submit(req, &public, &hidden).await,
        }
    }

    async fn submit(
        &self,
        req: &EvaluateRequest,
        public: &[(usize, &TestCase)],
        hidden: &[(usize, &TestCase)],
    ) -> Vec<ExecutionResult> {
        let mut results = self.fan_out(req, public).await;

        // Completion order of the batch is irrelevant; scan by index.
        if let Some(pos) = results.iter().position(|r| r.passed != Some(true)) {
            tracing::info!(
                test_case = results[pos].index + 1,
                "Public test failed, hidden tests will not run"
            );
            results.truncate(pos + 1);
            return results;
        }

        for &(index, case) in hidden {
            let res = self.run_case(req, index, case).await;
            let failed = res.passed != Some(true);
            results.push(res);
            if failed {
                tracing::info!(test_case = index + 1, "Hidden test failed, stopping");
                break;
            }
        }
        results
    }

    /// Run `cases` concurrently. Output keeps the order of `cases`.
    async fn fan_out(
        &self,
        req: &EvaluateRequest,
        cases: &[(usize, &TestCase)],
    ) -> Vec<ExecutionResult> {
        stream::iter(cases.iter())
            .map(|&(index, case)| self.run_case(req, index, case))
            .buffered(cases.len().max(1))
            .collect()
            .await
    }

    async fn run_case(
        &self,
        req: &EvaluateRequest,
        index: usize,
        case: &TestCase,
    ) -> ExecutionResult {
        let harness = build_harness(req.language, &req.code, case, req.adapter.as_ref());
        let expected = case.expected_output.as_deref();
        let span = tracing::debug_span!("test_case", index, hidden = case.is_hidden);

        match self
            .executor
            .execute(&harness, expected)
            .instrument(span)
            .await
        {
            Ok(out) => judge(index, case, out),
            Err(e) => {
                tracing::warn!(
                    backend = %self.executor.name(),
                    index,
                    "Test case could not be executed: {:#}",
                    e
                );
                ExecutionResult {
                    error_output: format!("{:#}", e),
                    status: EXECUTION_ERROR.into(),
                    passed: Some(false),
                    ..blank_result(index, case)
                }
            }
        }
    }
}

fn blank_result(index: usize, case: &TestCase) -> ExecutionResult {
    ExecutionResult {
        index,
        input: case.input.clone(),
        expected_output: case.expected_output.clone(),
        actual_output: String::new(),
        error_output: String::new(),
        status: String::new(),
        passed: None,
        execution_time_ms: None,
        memory_kb: None,
        is_hidden: case.is_hidden,
        diff: None,
    }
}

/// Turn a backend's [`RunOutput`] into a verdict for `case`.
fn judge(index: usize, case: &TestCase, out: RunOutput) -> ExecutionResult {
    let mut res = ExecutionResult {
        actual_output: normalize_output(&out.stdout),
        execution_time_ms: out.time_ms,
        memory_kb: out.memory_kb,
        ..blank_result(index, case)
    };

    let (passed, status, diff) = match (&out.status, case.expected_output.as_deref()) {
        (s, None) if s.is_success() => (true, out.status.describe(), None),
        (s, Some(expected)) if s.is_success() => match compare_output(&out.stdout, expected) {
            None => (true, out.status.describe(), None),
            Some(diff) => (false, RunStatus::WrongAnswer.describe(), Some(diff)),
        },
        (RunStatus::WrongAnswer, expected) => {
            let diff = expected.and_then(|e| compare_output(&out.stdout, e));
            (false, out.status.describe(), diff)
        }
        (s, _) => (false, s.describe(), None),
    };

    res.error_output = match &out.status {
        RunStatus::CompileError => out.compile_output,
        RunStatus::ToolMissing(tool) => format!("`{}` is not installed on this host", tool),
        _ if out.stderr.is_empty() => out.compile_output,
        _ => out.stderr,
    };
    res.passed = Some(passed);
    res.status = status;
    res.diff = diff;
    res
}
