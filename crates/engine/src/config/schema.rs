use std::time::Duration;

use serde::{Deserialize, Serialize};
use tripwire_common::retry::RetryConfig;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_rules_path")]
    pub rules_path: String,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EvaluationConfig {
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    #[serde(default = "default_timeout_fraction")]
    pub query_timeout_fraction: f64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct QueryConfig {
    #[serde(default = "default_query_url")]
    pub url: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_api_addr")]
    pub addr: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NotifyConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl EngineConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.evaluation.interval_seconds)
    }

    /// Hard deadline for one rule's query: a fraction of the tick period.
    pub fn query_timeout(&self) -> Duration {
        self.interval()
            .mul_f64(self.evaluation.query_timeout_fraction)
    }

    pub fn query_retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.query.max_attempts,
            initial_delay: Duration::from_millis(self.query.retry_delay_ms),
            ..RetryConfig::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: default_rules_path(),
            evaluation: EvaluationConfig::default(),
            query: QueryConfig::default(),
            api: ApiConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            query_timeout_fraction: default_timeout_fraction(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            url: default_query_url(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: default_api_addr(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_rules_path() -> String {
    "/etc/tripwire/alerts.yml".to_string()
}

fn default_interval_seconds() -> u64 {
    30
}

fn default_timeout_fraction() -> f64 {
    0.5
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_query_url() -> String {
    "http://127.0.0.1:9090".to_string()
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_api_addr() -> String {
    "0.0.0.0:9094".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_channel_capacity() -> usize {
    1024
}
