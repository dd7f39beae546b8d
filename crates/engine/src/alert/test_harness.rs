use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tripwire_common::labels::LabelSet;

use crate::alert::evaluator::Evaluator;
use crate::alert::event::{AlertEvent, AlertStatus};
use crate::alert::rule::Rule;
use crate::alert::state::AlertInstance;
use crate::alert::store::RuleStore;
use crate::alert::table::AlertStateTable;
use crate::query::{QueryAdapter, QueryError, Sample};

/// In-memory query adapter driven by tests. Each expression answers with
/// whatever was last set for it; unknown expressions return no series.
#[derive(Default)]
pub struct ScriptedAdapter {
    responses: DashMap<String, Result<Vec<Sample>, QueryError>>,
    delays: DashMap<String, Duration>,
    panics: DashMap<String, ()>,
    calls: DashMap<String, usize>,
}

impl ScriptedAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, expr: &str, samples: Vec<Sample>) {
        self.responses.insert(expr.to_string(), Ok(samples));
    }

    pub fn fail(&self, expr: &str, error: QueryError) {
        self.responses.insert(expr.to_string(), Err(error));
    }

    pub fn delay(&self, expr: &str, delay: Duration) {
        self.delays.insert(expr.to_string(), delay);
    }

    pub fn panic_on(&self, expr: &str) {
        self.panics.insert(expr.to_string(), ());
    }

    pub fn calls(&self, expr: &str) -> usize {
        self.calls.get(expr).map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl QueryAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn evaluate(&self, expr: &str, _at_ms: i64) -> Result<Vec<Sample>, QueryError> {
        *self.calls.entry(expr.to_string()).or_insert(0) += 1;

        let delay = self.delays.get(expr).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.panics.contains_key(expr) {
            panic!("scripted panic for {expr}");
        }

        self.responses
            .get(expr)
            .map(|r| r.value().clone())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn sample(labels: &[(&str, &str)], value: f64) -> Sample {
    let labels: LabelSet = labels.iter().copied().collect();
    Sample::new(labels, value)
}

/// One scripted tick: the responses to change before evaluating at `at_ms`.
/// Expressions not mentioned keep their previous response.
pub struct Step {
    pub at_ms: i64,
    pub responses: Vec<(String, Result<Vec<Sample>, QueryError>)>,
}

impl Step {
    pub fn at(at_ms: i64) -> Self {
        Self {
            at_ms,
            responses: Vec::new(),
        }
    }

    pub fn returns(mut self, expr: &str, samples: Vec<Sample>) -> Self {
        self.responses.push((expr.to_string(), Ok(samples)));
        self
    }

    pub fn fails(mut self, expr: &str, error: QueryError) -> Self {
        self.responses.push((expr.to_string(), Err(error)));
        self
    }
}

pub struct HarnessResult {
    pub events: Vec<AlertEvent>,
    pub firing_count: usize,
    pub resolved_count: usize,
    /// Table contents after each step.
    pub states: Vec<Vec<AlertInstance>>,
}

pub fn evaluator_for(rules: Vec<Rule>, adapter: Arc<ScriptedAdapter>) -> Arc<Evaluator> {
    Arc::new(Evaluator::new(
        Arc::new(RuleStore::new(rules)),
        Arc::new(AlertStateTable::new()),
        adapter,
        Duration::from_secs(1),
    ))
}

pub async fn run_harness(rules: Vec<Rule>, steps: Vec<Step>) -> HarnessResult {
    let adapter = ScriptedAdapter::new();
    let evaluator = evaluator_for(rules, adapter.clone());
    let mut all_events = Vec::new();
    let mut states = Vec::with_capacity(steps.len());

    for step in steps {
        for (expr, response) in step.responses {
            match response {
                Ok(samples) => adapter.set(&expr, samples),
                Err(e) => adapter.fail(&expr, e),
            }
        }
        all_events.extend(evaluator.tick(step.at_ms).await);
        states.push(evaluator.table().list(None));
    }

    let firing_count = all_events
        .iter()
        .filter(|e| e.status == AlertStatus::Firing)
        .count();
    let resolved_count = all_events
        .iter()
        .filter(|e| e.status == AlertStatus::Resolved)
        .count();

    HarnessResult {
        events: all_events,
        firing_count,
        resolved_count,
        states,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::rule::Severity;
    use crate::alert::state::AlertState;
    use std::collections::BTreeMap;

    const MINUTE: i64 = 60_000;

    fn service_down() -> Rule {
        Rule {
            group: "node".into(),
            name: "ServiceDown".into(),
            expr: "up == 0".into(),
            for_duration_ms: 5 * MINUTE,
            labels: [("severity", "critical")].into_iter().collect(),
            annotations: BTreeMap::new(),
            severity: Severity::Critical,
        }
    }

    fn down() -> Vec<Sample> {
        vec![sample(&[("__name__", "up"), ("job", "api")], 0.0)]
    }

    #[tokio::test]
    async fn service_down_scenario() {
        let mut steps = Vec::new();
        for tick in 1..=10 {
            let step = Step::at(tick * MINUTE);
            steps.push(if tick <= 4 {
                step.returns("up == 0", vec![])
            } else {
                step.returns("up == 0", down())
            });
        }

        let result = run_harness(vec![service_down()], steps).await;
        assert_eq!(result.firing_count, 1);
        assert_eq!(result.resolved_count, 0);
        assert!(result.states[3].is_empty());
        assert_eq!(result.states[4][0].state, AlertState::Pending);
        assert_eq!(result.states[8][0].state, AlertState::Pending);
        assert_eq!(result.states[9][0].state, AlertState::Firing);
        assert_eq!(result.events[0].timestamp_ms, 10 * MINUTE);
        assert_eq!(result.events[0].active_since_ms, 5 * MINUTE);
    }

    #[tokio::test]
    async fn breach_then_recovery() {
        let mut rule = service_down();
        rule.for_duration_ms = 0;
        let steps = vec![
            Step::at(0).returns("up == 0", down()),
            Step::at(MINUTE).returns("up == 0", vec![]),
        ];
        let result = run_harness(vec![rule], steps).await;
        assert_eq!(result.firing_count, 1);
        assert_eq!(result.resolved_count, 1);
    }

    #[tokio::test]
    async fn responses_are_sticky() {
        let mut rule = service_down();
        rule.for_duration_ms = 2 * MINUTE;
        let steps = vec![
            Step::at(0).returns("up == 0", down()),
            Step::at(MINUTE),
            Step::at(2 * MINUTE),
        ];
        let result = run_harness(vec![rule], steps).await;
        assert_eq!(result.firing_count, 1);
    }

    #[tokio::test]
    async fn failed_step_keeps_pending_state() {
        let steps = vec![
            Step::at(0).returns("up == 0", down()),
            Step::at(MINUTE).fails("up == 0", QueryError::Unreachable("down".into())),
        ];
        let result = run_harness(vec![service_down()], steps).await;
        assert_eq!(result.states[0], result.states[1]);
    }

    #[tokio::test]
    async fn adapter_counts_calls() {
        let adapter = ScriptedAdapter::new();
        adapter.evaluate("a", 0).await.unwrap();
        adapter.evaluate("a", 0).await.unwrap();
        assert_eq!(adapter.calls("a"), 2);
        assert_eq!(adapter.calls("b"), 0);
    }
}
