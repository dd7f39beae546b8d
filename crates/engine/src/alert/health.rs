use dashmap::DashMap;
use serde::Serialize;

use crate::query::QueryError;

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuleHealthStatus {
    pub rule_id: String,
    pub consecutive_failures: u32,
    pub faulted: bool,
    pub last_error: Option<String>,
    pub last_error_kind: Option<&'static str>,
    pub last_failure_ms: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthChange {
    Unchanged,
    FaultRaised,
    FaultCleared,
}

/// Counts consecutive query failures per rule. Reaching the threshold
/// raises a fault; the next successful query clears it.
pub struct RuleHealth {
    records: DashMap<String, RuleHealthStatus>,
    threshold: u32,
}

impl Default for RuleHealth {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

impl RuleHealth {
    pub fn new(threshold: u32) -> Self {
        Self {
            records: DashMap::new(),
            threshold: threshold.max(1),
        }
    }

    pub fn record_failure(&self, rule_id: &str, error: &QueryError, now_ms: i64) -> HealthChange {
        let mut record = self
            .records
            .entry(rule_id.to_string())
            .or_insert_with(|| RuleHealthStatus {
                rule_id: rule_id.to_string(),
                consecutive_failures: 0,
                faulted: false,
                last_error: None,
                last_error_kind: None,
                last_failure_ms: None,
            });

        record.consecutive_failures += 1;
        record.last_error = Some(error.to_string());
        record.last_error_kind = Some(error.kind());
        record.last_failure_ms = Some(now_ms);

        if !record.faulted && record.consecutive_failures >= self.threshold {
            record.faulted = true;
            HealthChange::FaultRaised
        } else {
            HealthChange::Unchanged
        }
    }

    pub fn record_success(&self, rule_id: &str) -> HealthChange {
        match self.records.remove(rule_id) {
            Some((_, record)) if record.faulted => HealthChange::FaultCleared,
            _ => HealthChange::Unchanged,
        }
    }

    pub fn forget(&self, rule_id: &str) {
        self.records.remove(rule_id);
    }

    pub fn is_faulted(&self, rule_id: &str) -> bool {
        self.records.get(rule_id).is_some_and(|r| r.faulted)
    }

    pub fn consecutive_failures(&self, rule_id: &str) -> u32 {
        self.records
            .get(rule_id)
            .map(|r| r.consecutive_failures)
            .unwrap_or(0)
    }

    pub fn list(&self) -> Vec<RuleHealthStatus> {
        let mut out: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        out.sort_by(|a, b| a.rule_id.cmp(&b.rule_id));
        out
    }

    pub fn faulted_count(&self) -> usize {
        self.records.iter().filter(|r| r.faulted).count()
    }
}
