use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use super::server::AppState;
use crate::alert::AlertState;
use crate::metrics::render_prometheus;

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let ev = &state.evaluator;
    let instances = ev.table().list(None);
    let firing = instances.iter().filter(|i| i.state == AlertState::Firing).count();
    let pending = instances.len() - firing;

    let gauges = [
        ("tripwire_rules_loaded", ev.rules().len() as u64),
        ("tripwire_alerts_pending", pending as u64),
        ("tripwire_alerts_firing", firing as u64),
        ("tripwire_rules_faulted", ev.health().faulted_count() as u64),
    ];
    let body = render_prometheus(ev.metrics(), &gauges);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
