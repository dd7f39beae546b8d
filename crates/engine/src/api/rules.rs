use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tripwire_common::clock::now_ms;

use super::server::AppState;
use crate::alert::{ReloadSummary, Rule, RuleHealthStatus};
use crate::notifier::forward;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn list_rules(State(state): State<AppState>) -> Json<Vec<Rule>> {
    Json(state.evaluator.rules().snapshot().to_vec())
}

pub async fn rule_health(State(state): State<AppState>) -> Json<Vec<RuleHealthStatus>> {
    Json(state.evaluator.health().list())
}

/// Re-reads the rules file. Resolved events produced by the swap go to the
/// notifier like any other event.
pub async fn reload(
    State(state): State<AppState>,
) -> Result<Json<ReloadSummary>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .evaluator
        .reload_from_file(&state.rules_path, now_ms())
        .await
    {
        Ok(outcome) => {
            forward(&state.events, outcome.events).await;
            Ok(Json(outcome.summary))
        }
        Err(e) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::test_harness::sample;

    const TWO_RULES: &str = "groups:\n  - name: node\n    rules:\n      - alert: Down\n        expr: up == 0\n      - alert: Slow\n        expr: slow\n";

    #[tokio::test]
    async fn lists_loaded_rules() {
        let (state, _adapter) = super::super::tests::state_with_rules(TWO_RULES);
        let rules = list_rules(State(state)).await;
        assert_eq!(rules.0.len(), 2);
        assert_eq!(rules.0[0].id(), "node/Down");
    }

    #[tokio::test]
    async fn reload_forwards_resolved_events() {
        let (state, adapter) = super::super::tests::state_with_rules(TWO_RULES);
        adapter.set("up == 0", vec![sample(&[("job", "api")], 0.0)]);
        state.evaluator.tick(0).await;

        std::fs::write(&state.rules_path, "groups: []\n").unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let state = AppState { events: tx, ..state };

        let summary = reload(State(state)).await.unwrap();
        assert_eq!(summary.0.rules, 0);
        assert_eq!(summary.0.resolved, 1);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.rule, "Down");
    }

    #[tokio::test]
    async fn invalid_file_is_unprocessable() {
        let (state, _adapter) = super::super::tests::state_with_rules(TWO_RULES);
        std::fs::write(&state.rules_path, "groups:\n  - name: node\n  - name: node\n").unwrap();

        let (status, body) = reload(State(state.clone())).await.unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.0.error.contains("duplicate group"));
        assert_eq!(state.evaluator.rules().len(), 2);
    }

    #[tokio::test]
    async fn health_lists_failing_rules() {
        let (state, adapter) = super::super::tests::state_with_rules(TWO_RULES);
        adapter.fail("slow", crate::query::QueryError::Unreachable("refused".into()));
        state.evaluator.tick(0).await;

        let health = rule_health(State(state)).await;
        assert_eq!(health.0.len(), 1);
        assert_eq!(health.0[0].rule_id, "node/Slow");
        assert_eq!(health.0[0].consecutive_failures, 1);
    }
}
