use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Cell;
use serde::Deserialize;
use tripwire_common::clock::now_ms;
use tripwire_common::labels::LabelSet;

use super::helpers;
use crate::output::{build_table, print_json, print_success, spinner, state_cell, OutputMode};

#[derive(Args)]
pub struct AlertsArgs {
    #[arg(long, value_parser = ["pending", "firing"], help = "Only show alerts in this state")]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlertRow {
    rule_id: String,
    severity: String,
    labels: LabelSet,
    state: String,
    value: f64,
    active_since_ms: i64,
}

pub async fn execute(
    args: AlertsArgs,
    mode: OutputMode,
    server: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    let base = helpers::resolve_api_url(server.as_deref(), config_path.as_deref())?;
    let url = alerts_url(&base, args.state.as_deref());

    let sp = match mode {
        OutputMode::Human => Some(spinner::create("Fetching alerts...")),
        OutputMode::Json => None,
    };

    let result = fetch(&url).await;
    if let Some(sp) = &sp {
        match &result {
            Ok(_) => spinner::finish_clear(sp),
            Err(_) => spinner::finish_err(sp, "Failed to fetch alerts"),
        }
    }
    let alerts = result?;

    match mode {
        OutputMode::Json => print_json(&alerts)?,
        OutputMode::Human => {
            if alerts.is_empty() {
                print_success("No active alerts");
                return Ok(());
            }
            let now = now_ms();
            let mut table = build_table(&["Rule", "State", "Severity", "Labels", "Value", "Since"]);
            for value in alerts {
                let a: AlertRow = serde_json::from_value(value).context("decoding alert")?;
                table.add_row(vec![
                    Cell::new(&a.rule_id),
                    state_cell(&a.state),
                    Cell::new(&a.severity),
                    Cell::new(helpers::format_labels(&a.labels)),
                    Cell::new(a.value),
                    Cell::new(helpers::since(now, a.active_since_ms)),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

pub(crate) fn alerts_url(base: &str, state: Option<&str>) -> String {
    match state {
        Some(s) => format!("{base}/v1/alerts?state={s}"),
        None => format!("{base}/v1/alerts"),
    }
}

async fn fetch(url: &str) -> Result<Vec<serde_json::Value>> {
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("connecting to {url}"))?
        .error_for_status()?;
    Ok(resp.json().await?)
}
