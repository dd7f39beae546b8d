//! Instant-query adapter for the Prometheus HTTP API (`/api/v1/query`).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tripwire_common::labels::{LabelSet, METRIC_NAME_LABEL};
use tripwire_common::retry::{retry_async_when, RetryConfig};

use super::{scalar_to_samples, QueryAdapter, QueryError, Sample};

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    data: Option<QueryData>,
    #[serde(rename = "errorType")]
    error_type: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
enum QueryData {
    Vector(Vec<VectorSample>),
    Scalar((f64, String)),
    Matrix(serde_json::Value),
    #[serde(rename = "string")]
    Str((f64, String)),
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    metric: HashMap<String, String>,
    value: (f64, String),
}

#[derive(Clone)]
pub struct PrometheusAdapter {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
    retry: RetryConfig,
}

impl PrometheusAdapter {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout.min(Duration::from_secs(2)))
            .build()
            .map_err(|e| QueryError::Unreachable(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            request_timeout,
            retry,
        })
    }

    async fn query_once(&self, expr: &str, at_ms: i64) -> Result<Vec<Sample>, QueryError> {
        let url = format!("{}/api/v1/query", self.base_url);
        let time = format!("{:.3}", at_ms as f64 / 1000.0);
        let params = [("query", expr), ("time", time.as_str())];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body: QueryResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(QueryError::Unreachable(format!("malformed response: {e}")))
            }
            Err(_) => return Err(QueryError::Unreachable(format!("HTTP {status}"))),
        };

        if body.status != "success" {
            return Err(classify_api_error(
                status,
                body.error_type.as_deref(),
                body.error.unwrap_or_else(|| "unknown error".into()),
                self.request_timeout,
            ));
        }

        let data = body
            .data
            .ok_or_else(|| QueryError::Unreachable("response without data".into()))?;
        decode_data(data)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> QueryError {
        if e.is_timeout() {
            QueryError::Timeout(self.request_timeout)
        } else {
            QueryError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl QueryAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    async fn evaluate(&self, expr: &str, at_ms: i64) -> Result<Vec<Sample>, QueryError> {
        retry_async_when(&self.retry, QueryError::is_transient, move || {
            self.query_once(expr, at_ms)
        })
        .await
    }
}

fn classify_api_error(
    status: StatusCode,
    error_type: Option<&str>,
    message: String,
    timeout: Duration,
) -> QueryError {
    match error_type {
        Some("bad_data") => QueryError::InvalidExpression(message),
        Some("timeout") | Some("canceled") => QueryError::Timeout(timeout),
        _ if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY => {
            QueryError::InvalidExpression(message)
        }
        _ => QueryError::Unreachable(format!("HTTP {status}: {message}")),
    }
}

fn decode_data(data: QueryData) -> Result<Vec<Sample>, QueryError> {
    match data {
        QueryData::Vector(samples) => samples
            .into_iter()
            .map(|s| {
                let value = parse_value(&s.value.1)?;
                let labels = LabelSet::from(s.metric).without(METRIC_NAME_LABEL);
                Ok(Sample::new(labels, value))
            })
            .collect(),
        QueryData::Scalar((_, v)) => Ok(scalar_to_samples(parse_value(&v)?)),
        QueryData::Matrix(_) => Err(QueryError::InvalidExpression(
            "expression yields a range vector".into(),
        )),
        QueryData::Str(_) => Err(QueryError::InvalidExpression(
            "expression yields a string".into(),
        )),
    }
}

fn parse_value(raw: &str) -> Result<f64, QueryError> {
    raw.parse::<f64>()
        .map_err(|_| QueryError::Unreachable(format!("malformed sample value {raw:?}")))
}
