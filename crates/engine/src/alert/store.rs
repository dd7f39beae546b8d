use std::sync::Arc;

use arc_swap::ArcSwap;

use super::rule::Rule;

/// The active rule set. Readers get a whole snapshot; a reload swaps in a new
/// one atomically and never mutates a snapshot in place.
pub struct RuleStore {
    current: ArcSwap<Vec<Rule>>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RuleStore {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            current: ArcSwap::from_pointee(rules),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<Rule>> {
        self.current.load_full()
    }

    /// Installs `rules` and returns the snapshot it replaced.
    pub fn replace(&self, rules: Vec<Rule>) -> Arc<Vec<Rule>> {
        self.current.swap(Arc::new(rules))
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.current.load().iter().any(|r| r.id() == rule_id)
    }

    pub fn get(&self, rule_id: &str) -> Option<Rule> {
        self.current.load().iter().find(|r| r.id() == rule_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::rule::Severity;
    use std::collections::BTreeMap;
    use tripwire_common::labels::LabelSet;

    fn rule(name: &str) -> Rule {
        Rule {
            group: "node".into(),
            name: name.into(),
            expr: "up == 0".into(),
            for_duration_ms: 0,
            labels: LabelSet::new(),
            annotations: BTreeMap::new(),
            severity: Severity::Warning,
        }
    }

    #[test]
    fn snapshot_survives_replace() {
        let store = RuleStore::new(vec![rule("A"), rule("B")]);
        let before = store.snapshot();

        let old = store.replace(vec![rule("C")]);
        assert_eq!(old.len(), 2);
        assert_eq!(before.len(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains("node/C"));
        assert!(!store.contains("node/A"));
    }

    #[test]
    fn get_by_id() {
        let store = RuleStore::new(vec![rule("A")]);
        assert_eq!(store.get("node/A").unwrap().name, "A");
        assert!(store.get("node/Z").is_none());
    }

    #[test]
    fn default_is_empty() {
        assert!(RuleStore::default().is_empty());
    }
}
