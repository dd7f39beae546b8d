use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use super::{alerts, health, metrics, rules};
use crate::alert::{AlertEvent, Evaluator};

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<Evaluator>,
    pub rules_path: PathBuf,
    pub events: mpsc::Sender<AlertEvent>,
    pub ready: Arc<AtomicBool>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/ready", get(health::ready))
        .route("/metrics", get(metrics::metrics))
        .route("/v1/alerts", get(alerts::list_alerts))
        .route("/v1/rules", get(rules::list_rules))
        .route("/v1/rules/health", get(rules::rule_health))
        .route("/v1/reload", post(rules::reload))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
