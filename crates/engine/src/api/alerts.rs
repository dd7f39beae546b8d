use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::server::AppState;
use crate::alert::{AlertInstance, AlertState};

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub state: Option<String>,
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<Vec<AlertInstance>>, StatusCode> {
    let filter = match query.state.as_deref() {
        None | Some("") => None,
        Some(s) => Some(AlertState::parse(s).ok_or(StatusCode::BAD_REQUEST)?),
    };
    Ok(Json(state.evaluator.table().list(filter)))
}
