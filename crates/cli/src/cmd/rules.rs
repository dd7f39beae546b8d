use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Deserialize;
use tripwire_engine::alert::{load_rules, Rule};

use super::helpers;
use crate::output::{build_table, print_error, print_json, print_success, spinner, OutputMode};

#[derive(Subcommand)]
pub enum RulesCmd {
    /// Validate a rules file without contacting the engine
    Check(CheckArgs),
    /// List the rules the running engine has loaded
    List,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    #[arg(help = "Rules file (defaults to the config's rules_path)")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RuleRow {
    group: String,
    name: String,
    expr: String,
    for_duration_ms: i64,
    severity: String,
}

pub async fn execute(
    cmd: RulesCmd,
    mode: OutputMode,
    server: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    match cmd {
        RulesCmd::Check(args) => check(args, mode, config_path.as_deref()),
        RulesCmd::List => {
            let base = helpers::resolve_api_url(server.as_deref(), config_path.as_deref())?;
            list(&base, mode).await
        }
    }
}

pub(crate) fn check(args: CheckArgs, mode: OutputMode, config_path: Option<&str>) -> Result<()> {
    let path = match args.file {
        Some(p) => p,
        None => PathBuf::from(helpers::load_config(config_path)?.rules_path),
    };

    let rules = match load_rules(&path) {
        Ok(rules) => rules,
        Err(e) => {
            if mode == OutputMode::Human {
                print_error(&format!("{}: {e}", path.display()));
            }
            return Err(e).with_context(|| format!("checking {}", path.display()));
        }
    };

    match mode {
        OutputMode::Json => print_json(&rules)?,
        OutputMode::Human => {
            print_success(&format!("{}: {} rules OK", path.display(), rules.len()));
            if !rules.is_empty() {
                println!("{}", rules_table(&rules));
            }
        }
    }
    Ok(())
}

pub(crate) fn rules_table(rules: &[Rule]) -> comfy_table::Table {
    let mut table = build_table(&["Group", "Alert", "For", "Severity", "Expr"]);
    for r in rules {
        table.add_row(vec![
            r.group.clone(),
            r.name.clone(),
            helpers::format_ms(r.for_duration_ms),
            r.severity.as_str().to_string(),
            r.expr.clone(),
        ]);
    }
    table
}

async fn list(base: &str, mode: OutputMode) -> Result<()> {
    let url = format!("{base}/v1/rules");

    let sp = match mode {
        OutputMode::Human => Some(spinner::create("Fetching rules...")),
        OutputMode::Json => None,
    };

    let result = fetch(&url).await;
    if let Some(sp) = &sp {
        match &result {
            Ok(_) => spinner::finish_clear(sp),
            Err(_) => spinner::finish_err(sp, "Failed to fetch rules"),
        }
    }
    let rules: Vec<serde_json::Value> = result?;

    match mode {
        OutputMode::Json => print_json(&rules)?,
        OutputMode::Human => {
            if rules.is_empty() {
                print_success("No alert rules loaded");
                return Ok(());
            }
            let mut table = build_table(&["Group", "Alert", "For", "Severity", "Expr"]);
            for value in rules {
                let r: RuleRow = serde_json::from_value(value).context("decoding rule")?;
                table.add_row(vec![
                    r.group,
                    r.name,
                    helpers::format_ms(r.for_duration_ms),
                    r.severity,
                    r.expr,
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

async fn fetch(url: &str) -> Result<Vec<serde_json::Value>> {
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("connecting to {url}"))?
        .error_for_status()?;
    Ok(resp.json().await?)
}

