use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Cell;

use super::helpers;
use crate::output::{build_table, print_error, print_json, print_success, OutputMode};

#[derive(Args)]
pub struct HealthArgs {
    #[arg(long, help = "Also list rules with failing queries")]
    pub rules: bool,
}

pub async fn execute(
    args: HealthArgs,
    mode: OutputMode,
    server: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    let base = helpers::resolve_api_url(server.as_deref(), config_path.as_deref())?;

    let healthz = check_endpoint(&format!("{base}/healthz")).await;
    let ready = check_endpoint(&format!("{base}/ready")).await;
    let rules = if args.rules {
        Some(rule_health(&format!("{base}/v1/rules/health")).await)
    } else {
        None
    };

    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "healthz": healthz.is_ok(),
            "ready": ready.is_ok(),
            "rules": rules.as_ref().and_then(|r| r.as_ref().ok()),
        }))?,
        OutputMode::Human => {
            match &healthz {
                Ok(_) => print_success("Health check: OK"),
                Err(e) => print_error(&format!("Health check: {e}")),
            }
            match &ready {
                Ok(_) => print_success("Ready check: OK"),
                Err(e) => print_error(&format!("Ready check: {e}")),
            }
            match &rules {
                None => {}
                Some(Err(e)) => print_error(&format!("Rule health: {e}")),
                Some(Ok(list)) if list.is_empty() => print_success("All rule queries healthy"),
                Some(Ok(list)) => {
                    let mut table =
                        build_table(&["Rule", "Failures", "Faulted", "Kind", "Last Error"]);
                    for r in list {
                        let faulted = r["faulted"].as_bool().unwrap_or(false);
                        table.add_row(vec![
                            Cell::new(r["rule_id"].as_str().unwrap_or("-")),
                            Cell::new(r["consecutive_failures"].as_u64().unwrap_or(0)),
                            Cell::new(if faulted { "yes" } else { "no" }),
                            Cell::new(r["last_error_kind"].as_str().unwrap_or("-")),
                            Cell::new(r["last_error"].as_str().unwrap_or("-")),
                        ]);
                    }
                    println!("{table}");
                }
            }
        }
    }

    Ok(())
}

async fn check_endpoint(url: &str) -> Result<()> {
    let resp = reqwest::get(url).await.context("connection failed")?;

    if resp.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("HTTP {}", resp.status())
    }
}

async fn rule_health(url: &str) -> Result<Vec<serde_json::Value>> {
    let resp = reqwest::get(url)
        .await
        .context("connection failed")?
        .error_for_status()?;
    Ok(resp.json().await?)
}
