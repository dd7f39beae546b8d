use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tripwire_common::labels::LabelSet;

use super::rule::{Rule, Severity};
use super::template::render_annotations;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Inactive,
    Pending,
    Firing,
}

impl AlertState {
    /// Next state given whether the condition holds at `now_ms` for an
    /// instance whose current streak started at `active_since_ms`.
    pub fn transition(
        self,
        condition_met: bool,
        active_since_ms: i64,
        now_ms: i64,
        for_duration_ms: i64,
    ) -> Self {
        match (self, condition_met) {
            (_, false) => Self::Inactive,
            (Self::Inactive, true) => {
                if for_duration_ms == 0 {
                    Self::Firing
                } else {
                    Self::Pending
                }
            }
            (Self::Pending, true) => {
                if now_ms - active_since_ms >= for_duration_ms {
                    Self::Firing
                } else {
                    Self::Pending
                }
            }
            (Self::Firing, true) => Self::Firing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Pending => "pending",
            Self::Firing => "firing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inactive" => Some(Self::Inactive),
            "pending" => Some(Self::Pending),
            "firing" => Some(Self::Firing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertInstance {
    pub rule_id: String,
    pub rule: String,
    pub group: String,
    pub severity: Severity,
    pub labels: LabelSet,
    pub state: AlertState,
    pub value: f64,
    pub active_since_ms: i64,
    pub last_evaluation_ms: i64,
    pub fired_at_ms: Option<i64>,
    pub resolved_at_ms: Option<i64>,
    pub annotations: BTreeMap<String, String>,
}

impl AlertInstance {
    /// A fresh instance for a streak starting at `now_ms`. It is still
    /// `Inactive` until the first [`observe`](Self::observe).
    pub fn new(rule: &Rule, labels: LabelSet, now_ms: i64) -> Self {
        Self {
            rule_id: rule.id(),
            rule: rule.name.clone(),
            group: rule.group.clone(),
            severity: rule.severity,
            labels,
            state: AlertState::Inactive,
            value: 0.0,
            active_since_ms: now_ms,
            last_evaluation_ms: now_ms,
            fired_at_ms: None,
            resolved_at_ms: None,
            annotations: BTreeMap::new(),
        }
    }

    /// Records that the condition held at `now_ms`. Returns `true` when this
    /// observation moved the instance into `Firing`.
    pub fn observe(&mut self, rule: &Rule, value: f64, now_ms: i64) -> bool {
        let next = self
            .state
            .transition(true, self.active_since_ms, now_ms, rule.for_duration_ms);
        let entered_firing = next == AlertState::Firing && self.state != AlertState::Firing;

        self.state = next;
        self.value = value;
        self.last_evaluation_ms = now_ms;

        if entered_firing {
            self.fired_at_ms = Some(now_ms);
            self.annotations = render_annotations(&rule.annotations, &self.labels, value);
        }
        entered_firing
    }

    pub fn resolve(mut self, now_ms: i64) -> Self {
        self.state = AlertState::Inactive;
        self.resolved_at_ms = Some(now_ms);
        self
    }

    pub fn is_firing(&self) -> bool {
        self.state == AlertState::Firing
    }
}
