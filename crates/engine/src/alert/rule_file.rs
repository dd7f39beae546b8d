//! Parsing and validation of rule files.
//!
//! ```yaml
//! groups:
//!   - name: node
//!     rules:
//!       - alert: ServiceDown
//!         expr: up == 0
//!         for: 5m
//!         labels:
//!           severity: critical
//!         annotations:
//!           summary: "{{ $labels.job }} is down"
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tripwire_common::duration::parse_duration;
use tripwire_common::labels::{is_valid_label_name, LabelSet};

use super::rule::{Rule, Severity};
use super::template;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("duplicate group {0:?}")]
    DuplicateGroup(String),
    #[error("group {group:?}: duplicate rule {rule:?}")]
    DuplicateRule { group: String, rule: String },
    #[error("{location}: {message}")]
    Invalid { location: String, message: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    #[serde(default)]
    groups: Vec<GroupDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupDef {
    name: String,
    #[serde(default)]
    interval: Option<String>,
    #[serde(default)]
    rules: Vec<RuleDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    alert: String,
    expr: String,
    #[serde(rename = "for", default)]
    for_duration: Option<String>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
}

pub fn load_rules(path: &Path) -> Result<Vec<Rule>, ParseError> {
    let contents = std::fs::read_to_string(path)?;
    parse_rules(&contents)
}

/// Parses a rule file into an ordered list of rules. Any invalid rule
/// rejects the whole file.
pub fn parse_rules(yaml: &str) -> Result<Vec<Rule>, ParseError> {
    let file: RuleFile = if yaml.trim().is_empty() {
        RuleFile { groups: Vec::new() }
    } else {
        serde_yaml::from_str(yaml)?
    };

    let mut rules = Vec::new();
    let mut group_names = HashSet::new();

    for group in file.groups {
        if group.name.trim().is_empty() {
            return Err(invalid("group", "name must not be empty"));
        }
        if !group_names.insert(group.name.clone()) {
            return Err(ParseError::DuplicateGroup(group.name));
        }
        if let Some(ref interval) = group.interval {
            parse_duration(interval)
                .map_err(|e| invalid(&format!("group {:?}", group.name), &format!("interval: {e}")))?;
        }

        let mut rule_names = HashSet::new();
        for def in group.rules {
            if !rule_names.insert(def.alert.clone()) {
                return Err(ParseError::DuplicateRule {
                    group: group.name.clone(),
                    rule: def.alert,
                });
            }
            rules.push(build_rule(&group.name, def)?);
        }
    }

    Ok(rules)
}

fn build_rule(group: &str, def: RuleDef) -> Result<Rule, ParseError> {
    let location = format!("group {group:?} rule {:?}", def.alert);

    if def.alert.trim().is_empty() {
        return Err(invalid(&format!("group {group:?}"), "alert name must not be empty"));
    }
    if def.expr.trim().is_empty() {
        return Err(invalid(&location, "expr must not be empty"));
    }

    let for_duration_ms = match def.for_duration.as_deref() {
        None => 0,
        Some(raw) => {
            let d = parse_duration(raw).map_err(|e| invalid(&location, &format!("for: {e}")))?;
            i64::try_from(d.as_millis())
                .map_err(|_| invalid(&location, &format!("for: {raw:?} is out of range")))?
        }
    };

    for (name, value) in &def.labels {
        if !is_valid_label_name(name) {
            return Err(invalid(&location, &format!("invalid label name {name:?}")));
        }
        template::validate(value)
            .map_err(|e| invalid(&location, &format!("label {name:?}: {e}")))?;
    }
    for (name, value) in &def.annotations {
        if !is_valid_label_name(name) {
            return Err(invalid(&location, &format!("invalid annotation name {name:?}")));
        }
        template::validate(value)
            .map_err(|e| invalid(&location, &format!("annotation {name:?}: {e}")))?;
    }

    // The raw label stays on the rule; only the coarse level falls back.
    let severity = match def.labels.get("severity") {
        None => Severity::default(),
        Some(s) => Severity::from_label(s).unwrap_or_else(|| {
            tracing::warn!(rule = %location, severity = %s, "unknown severity, using default");
            Severity::default()
        }),
    };

    Ok(Rule {
        group: group.to_string(),
        name: def.alert,
        expr: def.expr.trim().to_string(),
        for_duration_ms,
        labels: LabelSet::from(def.labels),
        annotations: def.annotations,
        severity,
    })
}

fn invalid(location: &str, message: &str) -> ParseError {
    ParseError::Invalid {
        location: location.to_string(),
        message: message.to_string(),
    }
}
