use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tripwire_common::labels::{LabelSet, ALERT_NAME_LABEL, METRIC_NAME_LABEL};

use super::event::AlertEvent;
use super::health::{HealthChange, RuleHealth};
use super::rule::Rule;
use super::rule_file::{load_rules, ParseError};
use super::state::{AlertInstance, AlertState};
use super::store::RuleStore;
use super::table::AlertStateTable;
use crate::metrics::EngineMetrics;
use crate::query::{QueryAdapter, QueryError, Sample};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub rules: usize,
    pub added: usize,
    pub removed: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone)]
pub struct ReloadOutcome {
    pub summary: ReloadSummary,
    pub events: Vec<AlertEvent>,
}

/// Drives rule evaluation against the query adapter and keeps the alert
/// state table in step with the results.
pub struct Evaluator {
    rules: Arc<RuleStore>,
    table: Arc<AlertStateTable>,
    adapter: Arc<dyn QueryAdapter>,
    health: Arc<RuleHealth>,
    metrics: Arc<EngineMetrics>,
    query_timeout: Duration,
}

impl Evaluator {
    pub fn new(
        rules: Arc<RuleStore>,
        table: Arc<AlertStateTable>,
        adapter: Arc<dyn QueryAdapter>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            rules,
            table,
            adapter,
            health: Arc::new(RuleHealth::default()),
            metrics: EngineMetrics::new(),
            query_timeout,
        }
    }

    pub fn with_health(mut self, health: Arc<RuleHealth>) -> Self {
        self.health = health;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    pub fn table(&self) -> &Arc<AlertStateTable> {
        &self.table
    }

    pub fn health(&self) -> &Arc<RuleHealth> {
        &self.health
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Runs one evaluation cycle over the current rule snapshot. Rules are
    /// evaluated concurrently, each in its own task; events come back in
    /// rule order.
    pub async fn tick(self: &Arc<Self>, now_ms: i64) -> Vec<AlertEvent> {
        let snapshot = self.rules.snapshot();
        if snapshot.is_empty() {
            debug!("no rules loaded");
            return Vec::new();
        }

        let mut tasks = JoinSet::new();
        for (idx, rule) in snapshot.iter().enumerate() {
            let evaluator = Arc::clone(self);
            let rule = rule.clone();
            tasks.spawn(async move { (idx, evaluator.evaluate_rule(&rule, now_ms).await) });
        }

        let mut results = Vec::with_capacity(snapshot.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) if e.is_panic() => {
                    self.metrics.inc_evaluation_failures();
                    error!(error = ?e, "rule evaluation panicked");
                }
                Err(e) => warn!(error = ?e, "rule evaluation cancelled"),
            }
        }

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().flat_map(|(_, events)| events).collect()
    }

    /// Evaluates a single rule at `now_ms` and returns the events it produced.
    pub async fn evaluate_rule(&self, rule: &Rule, now_ms: i64) -> Vec<AlertEvent> {
        let rule_id = rule.id();
        let started = Instant::now();

        let result = match tokio::time::timeout(
            self.query_timeout,
            self.adapter.evaluate(&rule.expr, now_ms),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout(self.query_timeout)),
        };
        self.metrics.inc_evaluations();
        self.metrics.record_evaluation_latency(started);

        let _guard = self.table.lock_rule(&rule_id).await;
        if !self.rules.contains(&rule_id) {
            debug!(rule = %rule_id, "rule removed during evaluation, discarding result");
            return Vec::new();
        }

        match result {
            Ok(samples) => {
                if self.health.record_success(&rule_id) == HealthChange::FaultCleared {
                    info!(rule = %rule_id, "rule health fault cleared");
                }
                self.reconcile(rule, samples, now_ms)
            }
            Err(e) => {
                self.on_query_failure(&rule_id, &e, now_ms);
                Vec::new()
            }
        }
    }

    fn on_query_failure(&self, rule_id: &str, e: &QueryError, now_ms: i64) {
        self.metrics.inc_evaluation_failures();
        warn!(rule = %rule_id, kind = e.kind(), error = %e, "query failed, alert state unchanged");

        if self.health.record_failure(rule_id, e, now_ms) == HealthChange::FaultRaised {
            self.metrics.inc_health_faults();
            error!(
                rule = %rule_id,
                failures = self.health.consecutive_failures(rule_id),
                "rule health fault: consecutive query failures"
            );
        }
    }

    /// Applies one successful query result to the rule's instances. The
    /// caller holds the rule lock.
    fn reconcile(&self, rule: &Rule, samples: Vec<Sample>, now_ms: i64) -> Vec<AlertEvent> {
        let rule_id = rule.id();
        let mut remaining = self.table.snapshot(&rule_id);
        let mut seen = HashSet::with_capacity(samples.len());
        let mut events = Vec::new();

        for sample in samples {
            let labels = instance_labels(rule, &sample.labels);
            if !seen.insert(labels.clone()) {
                debug!(rule = %rule_id, labels = %labels, "duplicate series after label merge, ignoring");
                continue;
            }

            let mut instance = remaining
                .remove(&labels)
                .unwrap_or_else(|| AlertInstance::new(rule, labels, now_ms));
            let was = instance.state;

            if instance.observe(rule, sample.value, now_ms) {
                info!(rule = %rule_id, labels = %instance.labels, "alert firing");
                events.push(AlertEvent::firing(&instance, now_ms));
            } else if was == AlertState::Inactive {
                debug!(rule = %rule_id, labels = %instance.labels, "alert pending");
            }
            self.table.upsert(instance);
        }

        let mut resolved = 0;
        for (labels, instance) in remaining {
            self.table.remove(&rule_id, &labels);
            if instance.is_firing() {
                let instance = instance.resolve(now_ms);
                info!(rule = %rule_id, labels = %instance.labels, "alert resolved");
                events.push(AlertEvent::resolved(&instance, now_ms));
                resolved += 1;
            } else {
                debug!(rule = %rule_id, labels = %labels, "pending alert cleared");
            }
        }

        self.metrics
            .add_alerts_fired((events.len() - resolved) as u64);
        self.metrics.add_alerts_resolved(resolved as u64);

        events.sort_by(|a, b| a.labels.cmp(&b.labels));
        events
    }

    /// Swaps in a new rule set. Every instance of a rule that is no longer
    /// present is dropped, and each one that was firing yields a resolved
    /// event in the returned outcome.
    pub async fn reload(&self, rules: Vec<Rule>, now_ms: i64) -> ReloadOutcome {
        let new_ids: HashSet<String> = rules.iter().map(Rule::id).collect();
        let count = rules.len();
        let old = self.rules.replace(rules);

        let added = new_ids
            .iter()
            .filter(|id| !old.iter().any(|r| &r.id() == *id))
            .count();

        let stale: BTreeSet<String> = old
            .iter()
            .map(Rule::id)
            .chain(self.table.rule_ids())
            .filter(|id| !new_ids.contains(id))
            .collect();

        let mut events = Vec::new();
        let mut removed = 0;
        for rule_id in &stale {
            let guard = self.table.lock_rule(rule_id).await;
            if self.rules.contains(rule_id) {
                continue;
            }
            removed += 1;
            for instance in self.table.remove_rule(rule_id) {
                if instance.is_firing() {
                    let instance = instance.resolve(now_ms);
                    info!(rule = %rule_id, labels = %instance.labels, "alert resolved by rule removal");
                    events.push(AlertEvent::resolved(&instance, now_ms));
                }
            }
            self.health.forget(rule_id);
            drop(guard);
            self.table.prune_lock(rule_id);
        }

        self.metrics.inc_rule_reloads();
        self.metrics.add_alerts_resolved(events.len() as u64);

        let summary = ReloadSummary {
            rules: count,
            added,
            removed,
            resolved: events.len(),
        };
        info!(
            rules = summary.rules,
            added = summary.added,
            removed = summary.removed,
            resolved = summary.resolved,
            "rule set reloaded"
        );

        ReloadOutcome { summary, events }
    }

    /// Loads `path` and reloads from it. A file that fails to parse leaves
    /// the current rule set in place.
    pub async fn reload_from_file(
        &self,
        path: &Path,
        now_ms: i64,
    ) -> Result<ReloadOutcome, ParseError> {
        match load_rules(path) {
            Ok(rules) => Ok(self.reload(rules, now_ms).await),
            Err(e) => {
                self.metrics.inc_rule_reload_failures();
                warn!(
                    path = %path.display(),
                    error = %e,
                    "rule reload rejected, keeping previous rule set"
                );
                Err(e)
            }
        }
    }
}

/// Label set identifying an instance: the series labels without the metric
/// name, overlaid with the rule's static labels and the alert name.
pub fn instance_labels(rule: &Rule, series: &LabelSet) -> LabelSet {
    series
        .without(METRIC_NAME_LABEL)
        .merge(&rule.labels)
        .with(ALERT_NAME_LABEL, rule.name.clone())
}
