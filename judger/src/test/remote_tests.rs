//! [`crate::runner::RemoteJudgeExecutor`] against a scripted in-process judge.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pretty_assertions::assert_eq;
use test_env_log::test;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use crate::{
    config::JudgeConfig,
    model::Language,
    runner::{
        remote::Submission, JudgeError, RemoteJudgeClient, RemoteJudgeExecutor, RetryPolicy,
        RunStatus, SubmissionQueue,
    },
};

/// A request as seen by the mock judge.
#[derive(Debug, Clone)]
struct Seen {
    head: String,
    body: serde_json::Value,
}

/// Status line that makes the mock judge close the connection unanswered.
const HANG_UP: &str = "";

/// Serves canned responses in order, one per connection, and keeps every
/// request it received.
struct MockJudge {
    url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

async fn read_request(stream: &mut TcpStream) -> Option<Seen> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = serde_json::from_slice(&buf[header_end..]).unwrap_or(serde_json::Value::Null);
    Some(Seen { head, body })
}

impl MockJudge {
    async fn start(responses: Vec<(&'static str, String)>) -> MockJudge {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(vec![]));
        let mut responses = responses.into_iter().collect::<VecDeque<_>>();

        let seen_by_server = seen.clone();
        tokio::spawn(async move {
            while let Some((status_line, body)) = responses.pop_front() {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                if let Some(req) = read_request(&mut stream).await {
                    seen_by_server.lock().unwrap().push(req);
                }
                if status_line == HANG_UP {
                    continue;
                }
                let resp = format!(
                    "HTTP/1.1 {}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        MockJudge {
            url: format!("http://{}", addr),
            seen,
        }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

fn b64(s: &str) -> String {
    STANDARD.encode(s)
}

fn accepted(stdout: &str) -> String {
    serde_json::json!({
        "stdout": b64(stdout),
        "stderr": null,
        "compile_output": null,
        "message": null,
        "status": {"id": 3, "description": "Accepted"},
        "time": "0.25",
        "memory": 3456,
        "exit_code": 0,
    })
    .to_string()
}

fn executor(url: &str) -> RemoteJudgeExecutor {
    let cfg = JudgeConfig {
        url: url.into(),
        request_timeout_ms: 5000,
        ..Default::default()
    };
    let client = RemoteJudgeClient::new(&cfg).unwrap();
    let retry = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(40),
    };
    RemoteJudgeExecutor::new(client, Arc::new(SubmissionQueue::new(2, 16)), retry)
}

fn submission(language: Language) -> Submission {
    Submission {
        language,
        source: "print('héllo')".into(),
        stdin: "2 3".into(),
        expected_output: Some("5".into()),
    }
}

#[test(tokio::test)]
async fn sends_base64_and_decodes_verdict() {
    let judge = MockJudge::start(vec![("200 OK", accepted("5\n"))]).await;
    let out = executor(&judge.url)
        .run(submission(Language::Python))
        .await
        .unwrap();

    assert_eq!(out.status, RunStatus::Accepted);
    assert_eq!(out.stdout, "5\n");
    assert_eq!(out.time_ms, Some(250.0));
    assert_eq!(out.memory_kb, Some(3456));
    assert_eq!(out.exit_code, Some(0));

    let seen = judge.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0]
        .head
        .starts_with("POST /submissions?base64_encoded=true&wait=true "));
    let body = &seen[0].body;
    assert_eq!(body["language_id"], 71);
    assert_eq!(body["source_code"], b64("print('héllo')"));
    assert_eq!(body["stdin"], b64("2 3"));
    assert_eq!(body["expected_output"], b64("5"));
    assert!(body.get("compiler_options").is_none());
}

#[test(tokio::test)]
async fn cpp_submissions_request_cpp17() {
    let judge = MockJudge::start(vec![("200 OK", accepted("5"))]).await;
    executor(&judge.url)
        .run(submission(Language::Cpp))
        .await
        .unwrap();
    let body = &judge.seen()[0].body;
    assert_eq!(body["language_id"], 54);
    assert_eq!(body["compiler_options"], "-std=c++17");
}

#[test(tokio::test)]
async fn server_errors_are_retried() {
    let judge = MockJudge::start(vec![
        ("503 Service Unavailable", "{}".into()),
        ("502 Bad Gateway", "{}".into()),
        ("200 OK", accepted("5")),
    ])
    .await;
    let out = executor(&judge.url)
        .run(submission(Language::Python))
        .await
        .unwrap();
    assert_eq!(out.stdout, "5");
    assert_eq!(judge.seen().len(), 3);
}

#[test(tokio::test)]
async fn dropped_connections_are_retried() {
    let judge = MockJudge::start(vec![(HANG_UP, String::new()), ("200 OK", accepted("5"))]).await;
    let out = executor(&judge.url)
        .run(submission(Language::Python))
        .await
        .unwrap();
    assert_eq!(out.status, RunStatus::Accepted);
    assert_eq!(out.stdout, "5");
    assert_eq!(judge.seen().len(), 2);
}

#[test(tokio::test)]
async fn judge_internal_errors_are_retried() {
    let internal = serde_json::json!({
        "stdout": null,
        "stderr": null,
        "compile_output": null,
        "message": b64("No such file or directory"),
        "status": {"id": 13, "description": "Internal Error"},
        "time": null,
        "memory": null,
    })
    .to_string();
    let judge = MockJudge::start(vec![("200 OK", internal), ("200 OK", accepted("5"))]).await;
    let out = executor(&judge.url)
        .run(submission(Language::Python))
        .await
        .unwrap();
    assert_eq!(out.status, RunStatus::Accepted);
    assert_eq!(judge.seen().len(), 2);
}

#[test(tokio::test)]
async fn client_errors_are_not_retried() {
    let judge = MockJudge::start(vec![
        ("422 Unprocessable Entity", r#"{"error":"bad language"}"#.into()),
        ("200 OK", accepted("5")),
    ])
    .await;
    let err = executor(&judge.url)
        .run(submission(Language::Python))
        .await
        .unwrap_err();
    assert!(matches!(err, JudgeError::Status(code, _) if code.as_u16() == 422));
    assert_eq!(judge.seen().len(), 1);
}

#[test(tokio::test)]
async fn exhausted_retries_return_last_error() {
    let judge = MockJudge::start(vec![
        ("500 Internal Server Error", "{}".into()),
        ("500 Internal Server Error", "{}".into()),
        ("503 Service Unavailable", "{}".into()),
    ])
    .await;
    let err = executor(&judge.url)
        .run(submission(Language::Python))
        .await
        .unwrap_err();
    assert!(matches!(err, JudgeError::Status(code, _) if code.as_u16() == 503));
    assert_eq!(judge.seen().len(), 3);
}

#[test(tokio::test)]
async fn unsupported_language_never_reaches_the_network() {
    let judge = MockJudge::start(vec![("200 OK", accepted("5"))]).await;
    let cfg = JudgeConfig {
        url: judge.url.clone(),
        language_ids: Some(vec![(Language::Python, 71)].into_iter().collect()),
        ..Default::default()
    };
    let exec = RemoteJudgeExecutor::new(
        RemoteJudgeClient::new(&cfg).unwrap(),
        Arc::new(SubmissionQueue::new(1, 1)),
        RetryPolicy::default(),
    );
    let err = exec.run(submission(Language::Go)).await.unwrap_err();
    assert!(matches!(err, JudgeError::UnsupportedLanguage(Language::Go)));
    assert!(judge.seen().is_empty());
}

#[test(tokio::test)]
async fn runtime_errors_keep_the_judge_description() {
    let body = serde_json::json!({
        "stdout": null,
        "stderr": b64("Traceback (most recent call last):\nZeroDivisionError"),
        "compile_output": null,
        "message": b64("Exited with error status 1"),
        "status": {"id": 11, "description": "Runtime Error (NZEC)"},
        "time": "0.020",
        "memory": 1024,
    })
    .to_string();
    let judge = MockJudge::start(vec![("200 OK", body)]).await;
    let out = executor(&judge.url)
        .run(submission(Language::Python))
        .await
        .unwrap();
    assert_eq!(out.status.describe(), "Runtime Error (NZEC)");
    assert!(out.stderr.ends_with("ZeroDivisionError"));
    assert_eq!(out.stdout, "");
}
