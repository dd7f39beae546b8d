use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;

use super::helpers;
use crate::output::{print_error, print_json, print_success, spinner, theme, OutputMode};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub async fn execute(
    mode: OutputMode,
    server: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    let base = helpers::resolve_api_url(server.as_deref(), config_path.as_deref())?;
    let url = format!("{base}/v1/reload");

    let sp = match mode {
        OutputMode::Human => Some(spinner::create("Reloading rules...")),
        OutputMode::Json => None,
    };

    let resp = reqwest::Client::new()
        .post(&url)
        .send()
        .await
        .with_context(|| format!("connecting to {url}"))?;

    if resp.status() == StatusCode::UNPROCESSABLE_ENTITY {
        let body: ErrorBody = resp.json().await.context("decoding reload error")?;
        if let Some(sp) = &sp {
            spinner::finish_err(sp, "Reload rejected");
        }
        if mode == OutputMode::Human {
            print_error(&body.error);
            theme::print_dim("The previous rule set is still active.");
        }
        anyhow::bail!("reload rejected: {}", body.error);
    }

    let summary: serde_json::Value = resp.error_for_status()?.json().await?;
    if let Some(sp) = &sp {
        spinner::finish_ok(sp, "Rules reloaded");
    }

    match mode {
        OutputMode::Json => print_json(&summary)?,
        OutputMode::Human => {
            for key in ["rules", "added", "removed", "resolved"] {
                let value = summary.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
                theme::print_kv(key, &value.to_string());
            }
            if summary.get("resolved").and_then(|v| v.as_u64()).unwrap_or(0) > 0 {
                print_success("Resolved notifications were sent for removed rules");
            }
        }
    }
    Ok(())
}
