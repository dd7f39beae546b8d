use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tripwire_common::labels::LabelSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub group: String,
    pub name: String,
    pub expr: String,
    pub for_duration_ms: i64,
    pub labels: LabelSet,
    pub annotations: BTreeMap<String, String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Critical,
}

impl Rule {
    /// Identity of the rule across reloads: group name plus alert name.
    pub fn id(&self) -> String {
        rule_id(&self.group, &self.name)
    }
}

pub fn rule_id(group: &str, name: &str) -> String {
    format!("{group}/{name}")
}

impl Severity {
    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_combines_group_and_name() {
        let rule = Rule {
            group: "node".into(),
            name: "ServiceDown".into(),
            expr: "up == 0".into(),
            for_duration_ms: 0,
            labels: LabelSet::new(),
            annotations: BTreeMap::new(),
            severity: Severity::Critical,
        };
        assert_eq!(rule.id(), "node/ServiceDown");
    }

    #[test]
    fn severity_from_label() {
        assert_eq!(Severity::from_label("critical"), Some(Severity::Critical));
        assert_eq!(Severity::from_label("info"), Some(Severity::Info));
        assert_eq!(Severity::from_label("page"), None);
        assert_eq!(Severity::default(), Severity::Warning);
    }
}
