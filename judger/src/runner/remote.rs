//! Client for a Judge0-compatible judge service, and the executor that sends
//! every call through the retry policy and the submission queue.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use err_derive::Error;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    StatusCode,
};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::BTreeMap, sync::Arc};
use tracing::instrument;

use super::{
    model::{Executor, RunOutput, RunStatus},
    queue::{QueueError, SubmissionQueue},
    retry::{retry_with_backoff, RetryPolicy, Retryable},
};
use crate::{config::JudgeConfig, harness::Harness, model::Language};

const ACCEPTED: u32 = 3;
const WRONG_ANSWER: u32 = 4;
const TIME_LIMIT_EXCEEDED: u32 = 5;
const COMPILATION_ERROR: u32 = 6;
const INTERNAL_ERROR: u32 = 13;

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error(display = "Language {} is not supported by the judge", _0)]
    UnsupportedLanguage(Language),

    #[error(display = "Judge request failed: {}", _0)]
    Request(#[error(source)] reqwest::Error),

    #[error(display = "Judge responded with HTTP {}: {}", _0, _1)]
    Status(StatusCode, String),

    #[error(display = "Judge reported an internal error: {}", _0)]
    Internal(String),

    #[error(display = "Malformed judge response: {}", _0)]
    Malformed(String),

    #[error(display = "{}", _0)]
    Queue(#[error(source)] QueueError),
}

impl Retryable for JudgeError {
    fn is_retryable(&self) -> bool {
        match self {
            JudgeError::Request(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().map_or(false, |s| s.is_server_error())
            }
            JudgeError::Status(code, _) => code.is_server_error(),
            JudgeError::Internal(_) => true,
            JudgeError::UnsupportedLanguage(_)
            | JudgeError::Malformed(_)
            | JudgeError::Queue(_) => false,
        }
    }
}

pub fn default_language_ids() -> BTreeMap<Language, u32> {
    vec![
        (Language::Python, 71),
        (Language::JavaScript, 63),
        (Language::TypeScript, 74),
        (Language::Java, 62),
        (Language::Cpp, 54),
        (Language::Go, 60),
    ]
    .into_iter()
    .collect()
}

#[derive(Debug, Serialize)]
struct SubmissionBody<'a> {
    source_code: String,
    language_id: u32,
    stdin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_output: Option<String>,
    cpu_time_limit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    compiler_options: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct JudgeStatus {
    id: u32,
    description: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionResponse {
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
    message: Option<String>,
    status: JudgeStatus,
    exit_code: Option<i32>,
    /// Seconds, as a decimal string
    time: Option<String>,
    /// Kilobytes
    memory: Option<u64>,
}

/// A judge call ready to be sent, with everything it needs owned.
#[derive(Debug, Clone)]
pub struct Submission {
    pub language: Language,
    pub source: String,
    pub stdin: String,
    pub expected_output: Option<String>,
}

impl Submission {
    pub fn from_harness(harness: &Harness, expected: Option<&str>) -> Self {
        Submission {
            language: harness.language,
            source: harness.source.clone(),
            stdin: harness.stdin.clone(),
            expected_output: expected.map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone)]
struct Endpoint {
    base: String,
    headers: HeaderMap,
}

/// Resolve the endpoint to talk to. The premium host is only used when a
/// credential is present; otherwise we fall back to the public url.
fn resolve_endpoint(cfg: &JudgeConfig) -> Endpoint {
    let mut headers = HeaderMap::new();
    match (&cfg.premium_host, &cfg.api_key) {
        (Some(host), Some(key)) => {
            match (key.parse::<HeaderValue>(), host.parse::<HeaderValue>()) {
                (Ok(key), Ok(host_value)) => {
                    headers.insert("x-rapidapi-key", key);
                    headers.insert("x-rapidapi-host", host_value);
                    tracing::info!(host = %host, "Using authenticated judge endpoint");
                    return Endpoint {
                        base: format!("https://{}", host),
                        headers,
                    };
                }
                _ => tracing::warn!(
                    "Judge credentials contain invalid header characters, using public endpoint"
                ),
            }
        }
        (Some(host), None) => tracing::warn!(
            host = %host,
            "Premium judge host configured without an API key, falling back to public endpoint"
        ),
        _ => {}
    }
    tracing::info!(url = %cfg.url, "Using public judge endpoint");
    Endpoint {
        base: cfg.url.trim_end_matches('/').to_owned(),
        headers,
    }
}

fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

fn decode(field: &'static str, text: Option<String>) -> Result<String, JudgeError> {
    let text = match text {
        Some(t) => t,
        None => return Ok(String::new()),
    };
    // Judge0 wraps long base64 fields across lines
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| JudgeError::Malformed(format!("field `{}`: {}", field, e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn map_status(status: &JudgeStatus) -> RunStatus {
    match status.id {
        ACCEPTED => RunStatus::Accepted,
        WRONG_ANSWER => RunStatus::WrongAnswer,
        TIME_LIMIT_EXCEEDED => RunStatus::TimeLimitExceeded,
        COMPILATION_ERROR => RunStatus::CompileError,
        _ => RunStatus::Other(status.description.clone()),
    }
}

/// Talks to the remote judge. One request per call, no retrying here.
#[derive(Debug, Clone)]
pub struct RemoteJudgeClient {
    client: reqwest::Client,
    endpoint: Endpoint,
    language_ids: BTreeMap<Language, u32>,
    cpu_time_limit: f64,
}

impl RemoteJudgeClient {
    pub fn new(cfg: &JudgeConfig) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(RemoteJudgeClient {
            client,
            endpoint: resolve_endpoint(cfg),
            language_ids: cfg
                .language_ids
                .clone()
                .unwrap_or_else(default_language_ids),
            cpu_time_limit: cfg.cpu_time_limit_secs,
        })
    }

    pub fn language_id(&self, language: Language) -> Option<u32> {
        self.language_ids.get(&language).copied()
    }

    pub fn supports(&self, language: Language) -> bool {
        self.language_id(language).is_some()
    }

    pub fn submissions_endpoint(&self) -> String {
        format!(
            "{}/submissions?base64_encoded=true&wait=true",
            self.endpoint.base
        )
    }

    #[instrument(skip(self, submission), fields(language = %submission.language))]
    pub async fn submit(&self, submission: &Submission) -> Result<RunOutput, JudgeError> {
        let language_id = self
            .language_id(submission.language)
            .ok_or(JudgeError::UnsupportedLanguage(submission.language))?;

        let body = SubmissionBody {
            source_code: encode(&submission.source),
            language_id,
            stdin: encode(&submission.stdin),
            expected_output: submission.expected_output.as_deref().map(encode),
            cpu_time_limit: self.cpu_time_limit,
            compiler_options: match submission.language {
                Language::Cpp => Some("-std=c++17"),
                _ => None,
            },
        };

        let res = self
            .client
            .post(self.submissions_endpoint())
            .headers(self.endpoint.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            tracing::debug!(%status, "Judge rejected submission");
            return Err(JudgeError::Status(status, text));
        }

        let raw = res.bytes().await?;
        let parsed: SubmissionResponse = serde_json::from_slice(&raw)
            .map_err(|e| JudgeError::Malformed(e.to_string()))?;
        tracing::debug!(
            status_id = parsed.status.id,
            status = %parsed.status.description,
            "Judge verdict"
        );

        if parsed.status.id == INTERNAL_ERROR {
            let message = decode("message", parsed.message)?;
            return Err(JudgeError::Internal(message));
        }

        let time_ms = match parsed.time.as_deref() {
            Some(t) => Some(
                t.trim()
                    .parse::<f64>()
                    .map_err(|e| JudgeError::Malformed(format!("field `time`: {}", e)))?
                    * 1000.0,
            ),
            None => None,
        };

        let mut stderr = decode("stderr", parsed.stderr)?;
        let message = decode("message", parsed.message)?;
        if stderr.is_empty() && !message.is_empty() {
            stderr = message;
        }

        Ok(RunOutput {
            status: map_status(&parsed.status),
            stdout: decode("stdout", parsed.stdout)?,
            stderr,
            compile_output: decode("compile_output", parsed.compile_output)?,
            exit_code: parsed.exit_code,
            time_ms,
            memory_kb: parsed.memory,
        })
    }
}

/// The graded backend: every judge call is retried with backoff, and each
/// attempt waits for a slot in the shared [`SubmissionQueue`].
#[derive(Debug, Clone)]
pub struct RemoteJudgeExecutor {
    client: Arc<RemoteJudgeClient>,
    queue: Arc<SubmissionQueue>,
    retry: RetryPolicy,
}

impl RemoteJudgeExecutor {
    pub fn new(client: RemoteJudgeClient, queue: Arc<SubmissionQueue>, retry: RetryPolicy) -> Self {
        RemoteJudgeExecutor {
            client: Arc::new(client),
            queue,
            retry,
        }
    }

    pub fn client(&self) -> &RemoteJudgeClient {
        &self.client
    }

    pub async fn run(&self, submission: Submission) -> Result<RunOutput, JudgeError> {
        if !self.client.supports(submission.language) {
            return Err(JudgeError::UnsupportedLanguage(submission.language));
        }
        let submission = Arc::new(submission);
        retry_with_backoff(&self.retry, || {
            let client = self.client.clone();
            let submission = submission.clone();
            async move {
                self.queue
                    .enqueue(async move { client.submit(&submission).await })
                    .await?
            }
        })
        .await
    }
}

#[async_trait]
impl Executor for RemoteJudgeExecutor {
    fn name(&self) -> Cow<'static, str> {
        "remote judge".into()
    }

    async fn execute(
        &self,
        harness: &Harness,
        expected: Option<&str>,
    ) -> anyhow::Result<RunOutput> {
        Ok(self.run(Submission::from_harness(harness, expected)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn premium_host_without_key_falls_back() {
        let cfg = JudgeConfig {
            url: "http://judge.local/".into(),
            premium_host: Some("judge0.p.rapidapi.com".into()),
            ..Default::default()
        };
        let ep = resolve_endpoint(&cfg);
        assert_eq!(ep.base, "http://judge.local");
        assert!(ep.headers.is_empty());
    }

    #[test]
    fn premium_host_with_key_sets_headers() {
        let cfg = JudgeConfig {
            premium_host: Some("judge0.p.rapidapi.com".into()),
            api_key: Some("secret".into()),
            ..Default::default()
        };
        let ep = resolve_endpoint(&cfg);
        assert_eq!(ep.base, "https://judge0.p.rapidapi.com");
        assert_eq!(ep.headers.get("X-RapidAPI-Key").unwrap(), "secret");
        assert_eq!(
            ep.headers.get("X-RapidAPI-Host").unwrap(),
            "judge0.p.rapidapi.com"
        );
    }

    #[test]
    fn decode_ignores_line_wrapping() {
        let wrapped = Some("aGVsbG8g\nd29ybGQ=\n".to_string());
        assert_eq!(decode("stdout", wrapped).unwrap(), "hello world");
        assert_eq!(decode("stdout", None).unwrap(), "");
        assert!(decode("stdout", Some("%%%".into())).is_err());
    }

    #[test]
    fn client_errors_are_not_retried() {
        let e = JudgeError::Status(StatusCode::BAD_REQUEST, "bad".into());
        assert!(!e.is_retryable());
        let e = JudgeError::Status(StatusCode::SERVICE_UNAVAILABLE, "busy".into());
        assert!(e.is_retryable());
        assert!(!JudgeError::UnsupportedLanguage(Language::Go).is_retryable());
    }
}
