use tripwire_engine::alert::test_harness::{evaluator_for, run_harness, sample, ScriptedAdapter, Step};
use tripwire_engine::alert::{parse_rules, AlertState, AlertStatus};
use tripwire_engine::query::QueryError;

const MINUTE: i64 = 60_000;

const RULES: &str = r#"
groups:
  - name: node
    rules:
      - alert: ServiceDown
        expr: up == 0
        for: 5m
        labels:
          severity: critical
        annotations:
          summary: "{{ $labels.job }} is down"
          description: "{{ $labels.instance }} has been unreachable for 5 minutes"
      - alert: HighLoad
        expr: node_load1 > 4
        labels:
          severity: warning
"#;

#[tokio::test]
async fn service_down_fires_once_after_five_minutes() {
    let rules = parse_rules(RULES).unwrap();
    let down = vec![sample(
        &[("__name__", "up"), ("job", "api"), ("instance", "10.0.0.1:9100")],
        0.0,
    )];

    let mut steps = Vec::new();
    for tick in 1..=10 {
        let step = Step::at(tick * MINUTE);
        steps.push(if tick <= 4 {
            step.returns("up == 0", vec![])
        } else {
            step.returns("up == 0", down.clone())
        });
    }

    let result = run_harness(rules, steps).await;
    assert_eq!(result.firing_count, 1);
    assert_eq!(result.resolved_count, 0);

    for state in &result.states[..4] {
        assert!(state.is_empty());
    }
    for state in &result.states[4..9] {
        assert_eq!(state[0].state, AlertState::Pending);
        assert_eq!(state[0].active_since_ms, 5 * MINUTE);
    }
    assert_eq!(result.states[9][0].state, AlertState::Firing);

    let fired = &result.events[0];
    assert_eq!(fired.status, AlertStatus::Firing);
    assert_eq!(fired.timestamp_ms, 10 * MINUTE);
    assert_eq!(fired.annotations["summary"], "api is down");
    assert_eq!(
        fired.annotations["description"],
        "10.0.0.1:9100 has been unreachable for 5 minutes"
    );
    assert_eq!(fired.labels.get("severity"), Some("critical"));
    assert_eq!(fired.labels.get("alertname"), Some("ServiceDown"));
}

#[tokio::test]
async fn outage_in_data_source_does_not_resolve() {
    let rules = parse_rules(RULES).unwrap();
    let load = vec![sample(&[("instance", "db-1")], 7.5)];
    let outage = || QueryError::Unreachable("connection refused".into());

    let steps = vec![
        Step::at(0).returns("node_load1 > 4", load.clone()),
        Step::at(MINUTE).fails("node_load1 > 4", outage()),
        Step::at(2 * MINUTE).fails("node_load1 > 4", outage()),
        Step::at(3 * MINUTE).returns("node_load1 > 4", load),
        Step::at(4 * MINUTE).returns("node_load1 > 4", vec![]),
    ];

    let result = run_harness(rules, steps).await;
    assert_eq!(result.firing_count, 1);
    assert_eq!(result.resolved_count, 1);
    assert_eq!(result.events[1].timestamp_ms, 4 * MINUTE);
    assert_eq!(result.states[2][0].state, AlertState::Firing);
}

#[tokio::test]
async fn removing_firing_rule_resolves_during_reload() {
    let adapter = ScriptedAdapter::new();
    let evaluator = evaluator_for(parse_rules(RULES).unwrap(), adapter.clone());
    adapter.set("node_load1 > 4", vec![sample(&[("instance", "db-1")], 9.0)]);

    let events = evaluator.tick(0).await;
    assert_eq!(events.len(), 1);

    let kept_only = r#"
groups:
  - name: node
    rules:
      - alert: ServiceDown
        expr: up == 0
        for: 5m
"#;
    let outcome = evaluator
        .reload(parse_rules(kept_only).unwrap(), MINUTE)
        .await;
    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.events[0].status, AlertStatus::Resolved);
    assert_eq!(outcome.events[0].rule, "HighLoad");
    assert_eq!(outcome.summary.rules, 1);
    assert_eq!(outcome.summary.removed, 1);

    assert!(evaluator.tick(2 * MINUTE).await.is_empty());
    assert!(evaluator.table().is_empty());
    assert_eq!(adapter.calls("node_load1 > 4"), 1);
}
