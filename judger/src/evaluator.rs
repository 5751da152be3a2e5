//! Entry point of the library: validates a request, picks a backend, runs
//! the tests and folds the results.

use err_derive::Error;
use std::sync::Arc;
use tracing_futures::Instrument;

use crate::{
    config::EvaluatorConfig,
    model::{EvaluateRequest, EvaluationOutcome, Language, Mode},
    runner::{
        Executor, JudgeError, LocalSandboxExecutor, RemoteJudgeClient, RemoteJudgeExecutor,
        RetryPolicy, SubmissionQueue,
    },
    tester::{aggregate, TestScheduler},
};

/// Problems with a request, found before anything is executed. Never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(display = "Unknown language: {}", _0)]
    UnknownLanguage(String),

    #[error(display = "No code was submitted")]
    EmptyCode,

    #[error(display = "The request has no test cases")]
    NoTestCases,

    #[error(display = "No execution backend is available")]
    NoBackend,

    #[error(display = "Language {} is not supported by the remote judge", _0)]
    UnsupportedLanguage(Language),
}

/// Which backends an [`Evaluator`] is allowed to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendChoice {
    Both,
    LocalOnly,
    RemoteOnly,
}

impl Default for BackendChoice {
    fn default() -> Self {
        BackendChoice::Both
    }
}

/// Owns the execution backends for the lifetime of the service.
///
/// `run` requests prefer the local sandbox and fall back to the remote judge;
/// `submit` requests prefer the remote judge and fall back to the local
/// sandbox.
#[derive(Clone, Default)]
pub struct Evaluator {
    local: Option<Arc<dyn Executor>>,
    remote: Option<Arc<dyn Executor>>,
    /// Languages the remote backend can take. `None` means all.
    remote_languages: Option<Vec<Language>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local(mut self, executor: Arc<dyn Executor>) -> Self {
        self.local = Some(executor);
        self
    }

    pub fn with_remote(mut self, executor: Arc<dyn Executor>) -> Self {
        self.remote = Some(executor);
        self
    }

    /// Restrict the remote backend to `languages`.
    pub fn with_remote_languages(mut self, languages: impl IntoIterator<Item = Language>) -> Self {
        self.remote_languages = Some(languages.into_iter().collect());
        self
    }

    /// Build the backends described by `cfg`. Spawns the submission queue
    /// workers, so this must run inside a tokio runtime.
    pub fn from_config(cfg: &EvaluatorConfig, choice: BackendChoice) -> Result<Self, JudgeError> {
        let mut evaluator = Evaluator::new();
        if choice != BackendChoice::RemoteOnly {
            let local = LocalSandboxExecutor::from_config(&cfg.sandbox);
            evaluator = evaluator.with_local(Arc::new(local));
        }
        if choice != BackendChoice::LocalOnly {
            let client = RemoteJudgeClient::new(&cfg.judge)?;
            let languages = Language::ALL
                .iter()
                .copied()
                .filter(|&l| client.supports(l))
                .collect::<Vec<_>>();
            let queue = Arc::new(SubmissionQueue::from_config(&cfg.queue));
            let remote = RemoteJudgeExecutor::new(client, queue, RetryPolicy::from(&cfg.retry));
            evaluator = evaluator
                .with_remote(Arc::new(remote))
                .with_remote_languages(languages);
        }
        Ok(evaluator)
    }

    fn remote_supports(&self, language: Language) -> bool {
        self.remote_languages
            .as_ref()
            .map_or(true, |ls| ls.contains(&language))
    }

    /// Pick the backend for `req` according to its mode.
    pub fn select_backend(
        &self,
        req: &EvaluateRequest,
    ) -> Result<Arc<dyn Executor>, ValidationError> {
        let remote = self
            .remote
            .as_ref()
            .filter(|_| self.remote_supports(req.language));
        let preferred = match req.mode {
            Mode::Run => self.local.as_ref().or(remote),
            Mode::Submit => remote.or(self.local.as_ref()),
        };
        match preferred {
            Some(executor) => Ok(executor.clone()),
            // A remote judge exists but cannot take this language
            None if self.remote.is_some() => {
                Err(ValidationError::UnsupportedLanguage(req.language))
            }
            None => Err(ValidationError::NoBackend),
        }
    }

    pub fn validate(&self, req: &EvaluateRequest) -> Result<(), ValidationError> {
        if req.code.trim().is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        if req.test_cases.is_empty() {
            return Err(ValidationError::NoTestCases);
        }
        Ok(())
    }

    /// Evaluate `req`. Only request validation can fail; every execution
    /// problem is reported inside the outcome.
    pub async fn evaluate(
        &self,
        req: &EvaluateRequest,
    ) -> Result<EvaluationOutcome, ValidationError> {
        self.validate(req)?;
        let executor = self.select_backend(req)?;

        let span = tracing::info_span!(
            "evaluate",
            mode = %req.mode,
            language = %req.language,
            problem_id = req.problem_id.as_deref().unwrap_or(""),
        );
        let outcome = async move {
            tracing::info!(
                backend = %executor.name(),
                tests = req.test_cases.len(),
                "Evaluating submission"
            );
            let results = TestScheduler::new(executor).schedule(req).await;
            let outcome = aggregate(req.test_cases.len(), results);
            tracing::info!(
                passed = outcome.passed_tests,
                executed = outcome.executed_tests,
                total = outcome.total_tests,
                all_passed = outcome.all_passed,
                "Evaluation finished"
            );
            outcome
        }
        .instrument(span)
        .await;
        Ok(outcome)
    }
}
