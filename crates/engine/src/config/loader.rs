use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use super::schema::EngineConfig;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("validation: {0}")]
    Validation(String),
}

pub fn load_from_file(path: &Path) -> Result<EngineConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<EngineConfig, LoadError> {
    let cfg: EngineConfig = if yaml.trim().is_empty() {
        EngineConfig::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Overlays `TRIPWIRE_*` variables read through `lookup` and re-validates.
/// Every config field has one; an empty `TRIPWIRE_WEBHOOK_URL` disables the
/// webhook.
pub fn apply_env_overrides<F>(cfg: &mut EngineConfig, lookup: F) -> Result<(), LoadError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("TRIPWIRE_RULES") {
        cfg.rules_path = v;
    }
    if let Some(v) = parsed(&lookup, "TRIPWIRE_INTERVAL_SECONDS")? {
        cfg.evaluation.interval_seconds = v;
    }
    if let Some(v) = parsed(&lookup, "TRIPWIRE_QUERY_TIMEOUT_FRACTION")? {
        cfg.evaluation.query_timeout_fraction = v;
    }
    if let Some(v) = parsed(&lookup, "TRIPWIRE_FAILURE_THRESHOLD")? {
        cfg.evaluation.failure_threshold = v;
    }
    if let Some(v) = lookup("TRIPWIRE_QUERY_URL") {
        cfg.query.url = v;
    }
    if let Some(v) = parsed(&lookup, "TRIPWIRE_QUERY_MAX_ATTEMPTS")? {
        cfg.query.max_attempts = v;
    }
    if let Some(v) = parsed(&lookup, "TRIPWIRE_QUERY_RETRY_DELAY_MS")? {
        cfg.query.retry_delay_ms = v;
    }
    if let Some(v) = lookup("TRIPWIRE_API_ADDR") {
        cfg.api.addr = v;
    }
    if let Some(v) = lookup("TRIPWIRE_WEBHOOK_URL") {
        cfg.notify.webhook_url = if v.is_empty() { None } else { Some(v) };
    }
    if let Some(v) = parsed(&lookup, "TRIPWIRE_NOTIFY_MAX_RETRIES")? {
        cfg.notify.max_retries = v;
    }
    if let Some(v) = parsed(&lookup, "TRIPWIRE_NOTIFY_BASE_DELAY_MS")? {
        cfg.notify.base_delay_ms = v;
    }
    if let Some(v) = parsed(&lookup, "TRIPWIRE_NOTIFY_CHANNEL_CAPACITY")? {
        cfg.notify.channel_capacity = v;
    }
    validate(cfg)
}

fn parsed<T, F>(lookup: &F, key: &str) -> Result<Option<T>, LoadError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LoadError::Validation(format!("{key}: cannot parse {raw:?}"))),
    }
}

pub fn validate(cfg: &EngineConfig) -> Result<(), LoadError> {
    if cfg.rules_path.is_empty() {
        return Err(LoadError::Validation("rules_path must not be empty".into()));
    }
    if cfg.query.url.is_empty() {
        return Err(LoadError::Validation("query.url must not be empty".into()));
    }
    if cfg.evaluation.interval_seconds == 0 {
        return Err(LoadError::Validation(
            "evaluation.interval_seconds must be > 0".into(),
        ));
    }
    let fraction = cfg.evaluation.query_timeout_fraction;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(LoadError::Validation(
            "evaluation.query_timeout_fraction must be in (0, 1]".into(),
        ));
    }
    if cfg.evaluation.failure_threshold == 0 {
        return Err(LoadError::Validation(
            "evaluation.failure_threshold must be > 0".into(),
        ));
    }
    if cfg.query.max_attempts == 0 {
        return Err(LoadError::Validation("query.max_attempts must be > 0".into()));
    }
    if cfg.notify.channel_capacity == 0 {
        return Err(LoadError::Validation(
            "notify.channel_capacity must be > 0".into(),
        ));
    }
    Ok(())
}
