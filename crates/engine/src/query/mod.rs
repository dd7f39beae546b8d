mod prometheus;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tripwire_common::labels::LabelSet;

pub use prometheus::PrometheusAdapter;

/// One element of an instant query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub labels: LabelSet,
    pub value: f64,
}

impl Sample {
    pub fn new(labels: LabelSet, value: f64) -> Self {
        Self { labels, value }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    #[error("data source unreachable: {0}")]
    Unreachable(String),
    #[error("invalid expression: {0}")]
    InvalidExpression(String),
}

impl QueryError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Unreachable(_) => "unreachable",
            Self::InvalidExpression(_) => "invalid_expression",
        }
    }

    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidExpression(_))
    }
}

/// Instant-query access to an external time-series source.
///
/// Implementations return every series the expression yields at `at_ms`.
/// A series being present in the result means the alert condition holds
/// for it; scalar results are reduced to a single label-less sample when
/// non-zero and to an empty result otherwise.
#[async_trait]
pub trait QueryAdapter: Send + Sync {
    fn name(&self) -> &str;
    async fn evaluate(&self, expr: &str, at_ms: i64) -> Result<Vec<Sample>, QueryError>;
}

pub(crate) fn scalar_to_samples(value: f64) -> Vec<Sample> {
    if value.is_nan() || value == 0.0 {
        Vec::new()
    } else {
        vec![Sample::new(LabelSet::new(), value)]
    }
}
