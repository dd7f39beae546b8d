use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tripwire_common::duration::format_duration;
use tripwire_common::labels::LabelSet;
use tripwire_engine::config::{load_from_file, EngineConfig};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:9094";

pub fn default_config_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join("tripwire").join("tripwire.yml");
    }
    PathBuf::from("/etc/tripwire/tripwire.yml")
}

pub fn load_config(config_path: Option<&str>) -> Result<EngineConfig> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    load_from_file(&path).with_context(|| format!("loading config from {}", path.display()))
}

/// Base URL of the engine API: the `--server` flag, then the config's
/// `api.addr`, then the local default. An explicit `--config` that cannot be
/// loaded is an error; a missing default config is not.
pub fn resolve_api_url(server_flag: Option<&str>, config_path: Option<&str>) -> Result<String> {
    if let Some(s) = server_flag {
        return Ok(s.trim_end_matches('/').to_string());
    }
    match config_path {
        Some(_) => Ok(url_from_addr(&load_config(config_path)?.api.addr)),
        None => Ok(load_config(None)
            .map(|cfg| url_from_addr(&cfg.api.addr))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string())),
    }
}

/// Turns a listen address into something a client can connect to.
pub fn url_from_addr(addr: &str) -> String {
    if addr.starts_with("http://") || addr.starts_with("https://") {
        return addr.trim_end_matches('/').to_string();
    }
    let addr = match addr.strip_prefix("0.0.0.0:") {
        Some(port) => format!("127.0.0.1:{port}"),
        None => addr.to_string(),
    };
    format!("http://{addr}")
}

pub fn format_labels(labels: &LabelSet) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_ms(ms: i64) -> String {
    format_duration(Duration::from_millis(ms.max(0) as u64))
}

/// Human "5m ago" for an epoch-millisecond timestamp.
pub fn since(now_ms: i64, ts_ms: i64) -> String {
    let elapsed = (now_ms - ts_ms) / 1000 * 1000;
    format!("{} ago", format_ms(elapsed))
}
