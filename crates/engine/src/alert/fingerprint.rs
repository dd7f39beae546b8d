use std::hash::{Hash, Hasher};

use tripwire_common::labels::LabelSet;

/// Stable identity of one alert instance within this process.
pub fn fingerprint(rule_id: &str, labels: &LabelSet) -> u64 {
    let mut hasher = std::hash::DefaultHasher::new();
    rule_id.hash(&mut hasher);
    labels.hash(&mut hasher);
    hasher.finish()
}

pub fn fingerprint_string(rule_id: &str, labels: &LabelSet) -> String {
    format!("{:016x}", fingerprint(rule_id, labels))
}
