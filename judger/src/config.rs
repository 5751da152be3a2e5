//! Configuration consumed by the judger. Owned by whoever starts the service.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, path::PathBuf, time::Duration};

use crate::model::Language;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub judge: JudgeConfig,
    pub sandbox: SandboxConfig,
    pub queue: QueueConfig,
    pub retry: RetryConfig,
}

impl EvaluatorConfig {
    /// Read a TOML config file, then apply environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<EvaluatorConfig> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut cfg = toml::from_str::<EvaluatorConfig>(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Override judge endpoint and credentials from `JUDGE_URL`,
    /// `JUDGE_PREMIUM_HOST` and `JUDGE_API_KEY`.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("JUDGE_URL") {
            self.judge.url = url;
        }
        if let Ok(host) = std::env::var("JUDGE_PREMIUM_HOST") {
            self.judge.premium_host = Some(host).filter(|h| !h.is_empty());
        }
        if let Ok(key) = std::env::var("JUDGE_API_KEY") {
            self.judge.api_key = Some(key).filter(|k| !k.is_empty());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// The public judge endpoint, used whenever no credential is present.
    pub url: String,
    /// Host of the authenticated endpoint. Only used with `api_key`.
    pub premium_host: Option<String>,
    pub api_key: Option<String>,
    /// Judge-side language ids. When present, replaces the default table
    /// entirely, so languages left out become unsupported.
    pub language_ids: Option<BTreeMap<Language, u32>>,
    /// Time limit hint sent along with every submission.
    pub cpu_time_limit_secs: f64,
    pub request_timeout_ms: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        JudgeConfig {
            url: "https://ce.judge0.com".into(),
            premium_host: None,
            api_key: None,
            language_ids: None,
            cpu_time_limit_secs: 5.0,
            request_timeout_ms: 30_000,
        }
    }
}

impl JudgeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub timeout_ms: u64,
    pub compile_timeout_ms: u64,
    pub output_limit_bytes: usize,
    /// Parent of the per-run scratch directories. System temp dir if unset.
    pub temp_root: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            timeout_ms: 5000,
            compile_timeout_ms: 15_000,
            output_limit_bytes: 1024 * 1024,
            temp_root: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of judge calls in flight at once.
    pub width: usize,
    /// Bound of the pending-task channel. Enqueuers wait when it is full.
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            width: 2,
            capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: EvaluatorConfig = toml::from_str(
            r#"
            [judge]
            url = "http://localhost:2358"

            [judge.language_ids]
            python = 92

            [queue]
            width = 4
            "#,
        )
        .unwrap();
        assert_eq!(cfg.judge.url, "http://localhost:2358");
        assert_eq!(cfg.judge.request_timeout_ms, 30_000);
        assert_eq!(
            cfg.judge.language_ids.unwrap().get(&Language::Python),
            Some(&92)
        );
        assert_eq!(cfg.queue.width, 4);
        assert_eq!(cfg.queue.capacity, 256);
        assert_eq!(cfg.sandbox.output_limit_bytes, 1024 * 1024);
        assert_eq!(cfg.retry.max_attempts, 3);
    }
}
