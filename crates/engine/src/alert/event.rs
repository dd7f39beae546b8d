use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tripwire_common::labels::LabelSet;

use super::fingerprint::fingerprint_string;
use super::rule::Severity;
use super::state::AlertInstance;

/// A state-change edge handed to the notifier: emitted once when an
/// instance enters `Firing` and once when a firing instance goes away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub fingerprint: String,
    #[serde(rename = "type")]
    pub status: AlertStatus,
    pub rule: String,
    pub group: String,
    pub severity: Severity,
    pub labels: LabelSet,
    pub annotations: BTreeMap<String, String>,
    pub value: f64,
    pub active_since_ms: i64,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Firing,
    Resolved,
}

impl AlertEvent {
    pub fn firing(instance: &AlertInstance, now_ms: i64) -> Self {
        Self::from_instance(instance, AlertStatus::Firing, now_ms)
    }

    pub fn resolved(instance: &AlertInstance, now_ms: i64) -> Self {
        Self::from_instance(instance, AlertStatus::Resolved, now_ms)
    }

    fn from_instance(instance: &AlertInstance, status: AlertStatus, now_ms: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            fingerprint: fingerprint_string(&instance.rule_id, &instance.labels),
            status,
            rule: instance.rule.clone(),
            group: instance.group.clone(),
            severity: instance.severity,
            labels: instance.labels.clone(),
            annotations: instance.annotations.clone(),
            value: instance.value,
            active_since_ms: instance.active_since_ms,
            timestamp_ms: now_ms,
        }
    }

    pub fn rule_id(&self) -> String {
        super::rule::rule_id(&self.group, &self.rule)
    }

    pub fn severity_str(&self) -> &str {
        match self.severity {
            Severity::Info => "INFO",
            Severity::Warning => "WARN",
            Severity::Critical => "CRIT",
        }
    }

    pub fn status_str(&self) -> &str {
        match self.status {
            AlertStatus::Firing => "firing",
            AlertStatus::Resolved => "resolved",
        }
    }
}
