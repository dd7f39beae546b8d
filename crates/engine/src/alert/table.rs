use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tripwire_common::labels::LabelSet;

use super::state::{AlertInstance, AlertState};

/// Live alert instances keyed by rule id, then by label set.
///
/// A rule with no active instance has no entry at all. Callers that
/// read-modify-write one rule's instances hold [`lock_rule`](Self::lock_rule)
/// for the duration of the update.
#[derive(Default)]
pub struct AlertStateTable {
    instances: DashMap<String, HashMap<LabelSet, AlertInstance>>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AlertStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock_rule(&self, rule_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(rule_id.to_string())
            .or_default()
            .value()
            .clone();
        lock.lock_owned().await
    }

    pub fn upsert(&self, instance: AlertInstance) -> Option<AlertInstance> {
        self.instances
            .entry(instance.rule_id.clone())
            .or_default()
            .insert(instance.labels.clone(), instance)
    }

    pub fn get(&self, rule_id: &str, labels: &LabelSet) -> Option<AlertInstance> {
        self.instances
            .get(rule_id)
            .and_then(|m| m.get(labels).cloned())
    }

    pub fn remove(&self, rule_id: &str, labels: &LabelSet) -> Option<AlertInstance> {
        let mut entry = self.instances.get_mut(rule_id)?;
        let removed = entry.remove(labels);
        let now_empty = entry.is_empty();
        drop(entry);
        if now_empty {
            self.instances.remove_if(rule_id, |_, m| m.is_empty());
        }
        removed
    }

    /// Copy of one rule's instances, for reconciliation.
    pub fn snapshot(&self, rule_id: &str) -> HashMap<LabelSet, AlertInstance> {
        self.instances
            .get(rule_id)
            .map(|m| m.value().clone())
            .unwrap_or_default()
    }

    /// All instances, optionally filtered by state, ordered by rule then labels.
    pub fn list(&self, state: Option<AlertState>) -> Vec<AlertInstance> {
        let mut out: Vec<AlertInstance> = self
            .instances
            .iter()
            .flat_map(|entry| entry.value().values().cloned().collect::<Vec<_>>())
            .filter(|i| state.map_or(true, |s| i.state == s))
            .collect();
        out.sort_by(|a, b| {
            a.rule_id
                .cmp(&b.rule_id)
                .then_with(|| a.labels.cmp(&b.labels))
        });
        out
    }

    /// Drops the lock entry of a rule nobody holds or waits on. A held
    /// lock stays so its holder and the next caller still share it.
    pub fn prune_lock(&self, rule_id: &str) -> bool {
        self.locks
            .remove_if(rule_id, |_, lock| Arc::strong_count(lock) == 1)
            .is_some()
    }

    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Drops every instance of a rule and returns them. The lock entry is
    /// left to [`prune_lock`](Self::prune_lock).
    pub fn remove_rule(&self, rule_id: &str) -> Vec<AlertInstance> {
        let mut removed: Vec<AlertInstance> = self
            .instances
            .remove(rule_id)
            .map(|(_, m)| m.into_values().collect())
            .unwrap_or_default();
        removed.sort_by(|a, b| a.labels.cmp(&b.labels));
        removed
    }

    pub fn rule_ids(&self) -> Vec<String> {
        self.instances.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.instances.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::rule::{Rule, Severity};
    use std::collections::BTreeMap;

    fn rule(name: &str) -> Rule {
        Rule {
            group: "g".into(),
            name: name.into(),
            expr: "up == 0".into(),
            for_duration_ms: 0,
            labels: LabelSet::new(),
            annotations: BTreeMap::new(),
            severity: Severity::Warning,
        }
    }

    fn instance(rule_name: &str, job: &str, state: AlertState) -> AlertInstance {
        let labels: LabelSet = [("job", job)].into_iter().collect();
        let mut inst = AlertInstance::new(&rule(rule_name), labels, 1000);
        inst.state = state;
        inst
    }

    #[test]
    fn upsert_and_get() {
        let table = AlertStateTable::new();
        assert!(table.upsert(instance("A", "api", AlertState::Pending)).is_none());
        let labels: LabelSet = [("job", "api")].into_iter().collect();
        let got = table.get("g/A", &labels).unwrap();
        assert_eq!(got.state, AlertState::Pending);

        let prev = table.upsert(instance("A", "api", AlertState::Firing));
        assert_eq!(prev.unwrap().state, AlertState::Pending);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_last_instance_drops_rule_entry() {
        let table = AlertStateTable::new();
        table.upsert(instance("A", "api", AlertState::Firing));
        let labels: LabelSet = [("job", "api")].into_iter().collect();
        assert!(table.remove("g/A", &labels).is_some());
        assert!(table.is_empty());
        assert!(table.rule_ids().is_empty());
        assert!(table.remove("g/A", &labels).is_none());
    }

    #[test]
    fn snapshot_is_per_rule() {
        let table = AlertStateTable::new();
        table.upsert(instance("A", "api", AlertState::Firing));
        table.upsert(instance("A", "db", AlertState::Pending));
        table.upsert(instance("B", "api", AlertState::Firing));
        assert_eq!(table.snapshot("g/A").len(), 2);
        assert_eq!(table.snapshot("g/B").len(), 1);
        assert!(table.snapshot("g/C").is_empty());
    }

    #[test]
    fn list_filters_by_state() {
        let table = AlertStateTable::new();
        table.upsert(instance("A", "api", AlertState::Firing));
        table.upsert(instance("A", "db", AlertState::Pending));
        table.upsert(instance("B", "api", AlertState::Firing));

        assert_eq!(table.list(None).len(), 3);
        let firing = table.list(Some(AlertState::Firing));
        assert_eq!(firing.len(), 2);
        assert_eq!(firing[0].rule_id, "g/A");
        assert_eq!(firing[1].rule_id, "g/B");
        assert_eq!(table.list(Some(AlertState::Pending)).len(), 1);
    }

    #[test]
    fn remove_rule_returns_instances() {
        let table = AlertStateTable::new();
        table.upsert(instance("A", "api", AlertState::Firing));
        table.upsert(instance("A", "db", AlertState::Pending));
        let removed = table.remove_rule("g/A");
        assert_eq!(removed.len(), 2);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn prune_skips_held_lock() {
        let table = AlertStateTable::new();
        let guard = table.lock_rule("g/A").await;
        assert!(!table.prune_lock("g/A"));
        assert_eq!(table.lock_count(), 1);

        drop(guard);
        assert!(table.prune_lock("g/A"));
        assert_eq!(table.lock_count(), 0);
        assert!(!table.prune_lock("g/missing"));
    }

    #[tokio::test]
    async fn rule_lock_serializes() {
        let table = Arc::new(AlertStateTable::new());
        let guard = table.lock_rule("g/A").await;

        let t = table.clone();
        let waiter = tokio::spawn(async move {
            let _g = t.lock_rule("g/A").await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        let _other = table.lock_rule("g/B").await;
        drop(guard);
        waiter.await.unwrap();
    }
}
