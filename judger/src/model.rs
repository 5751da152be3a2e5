//! Data structures exchanged with the surrounding web layer.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::evaluator::ValidationError;

/// Languages the judger knows how to harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    Go,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Cpp,
        Language::Go,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::Go => "go",
        }
    }

    /// Whether this language needs a separate compile step before running.
    pub fn is_compiled(&self) -> bool {
        matches!(self, Language::Java | Language::Cpp | Language::Go)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Language::Python,
            "javascript" | "js" | "node" | "nodejs" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "java" => Language::Java,
            "cpp" | "c++" | "cxx" => Language::Cpp,
            "go" | "golang" => Language::Go,
            _ => return Err(ValidationError::UnknownLanguage(s.to_owned())),
        })
    }
}

impl TryFrom<String> for Language {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Evaluation mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ad-hoc run: every test case executes, no early stop.
    Run,
    /// Graded submission: public tests first, then hidden tests, stop on failure.
    Submit,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Run
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Run => f.write_str("run"),
            Mode::Submit => f.write_str("submit"),
        }
    }
}

/// A single test case. Immutable for the lifetime of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl TestCase {
    pub fn public(input: impl Into<String>, expected: impl Into<String>) -> Self {
        TestCase {
            input: input.into(),
            expected_output: Some(expected.into()),
            is_hidden: false,
            explanation: None,
        }
    }

    pub fn hidden(input: impl Into<String>, expected: impl Into<String>) -> Self {
        TestCase {
            is_hidden: true,
            ..TestCase::public(input, expected)
        }
    }
}

/// Problem-specific glue that tells the harness how to call the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adapter {
    /// Extra source merged with the candidate (helper types, parsers...).
    #[serde(default)]
    pub code: Option<String>,
    /// Expression producing the value to print, e.g. `solve(parse(input_data))`.
    #[serde(default)]
    pub entry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub code: String,
    pub language: Language,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<Adapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_id: Option<String>,
}

/// The verdict of one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Index of the test case in the original request.
    pub index: usize,
    pub input: String,
    pub expected_output: Option<String>,
    pub actual_output: String,
    pub error_output: String,
    pub status: String,
    /// `None` means the test case was not executed.
    pub passed: Option<bool>,
    pub execution_time_ms: Option<f64>,
    pub memory_kb: Option<u64>,
    pub is_hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub average_ms: Option<f64>,
    pub fastest_ms: Option<f64>,
    pub slowest_ms: Option<f64>,
    pub peak_memory_kb: Option<u64>,
}

/// Pointer to the first failing test, in public-before-hidden order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstFailure {
    /// 1-indexed position of the test case in the original request.
    pub test_case: usize,
    pub input: String,
    pub expected_output: Option<String>,
    pub actual_output: String,
    pub error_output: String,
    pub status: String,
    pub is_hidden: bool,
}

impl From<&ExecutionResult> for FirstFailure {
    fn from(r: &ExecutionResult) -> Self {
        FirstFailure {
            test_case: r.index + 1,
            input: r.input.clone(),
            expected_output: r.expected_output.clone(),
            actual_output: r.actual_output.clone(),
            error_output: r.error_output.clone(),
            status: r.status.clone(),
            is_hidden: r.is_hidden,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOutcome {
    pub results: Vec<ExecutionResult>,
    pub first_failure: Option<FirstFailure>,
    pub passed_tests: usize,
    pub total_tests: usize,
    pub executed_tests: usize,
    pub all_passed: bool,
    pub performance_summary: Option<PerformanceSummary>,
}
