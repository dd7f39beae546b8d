//! Label sets used as structural map keys.
//!
//! A [`LabelSet`] is an immutable sequence of `(name, value)` pairs kept
//! sorted by name, so two sets built from the same pairs in any order compare,
//! hash and serialize identically.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const METRIC_NAME_LABEL: &str = "__name__";
pub const ALERT_NAME_LABEL: &str = "alertname";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(Vec<(String, String)>);

impl LabelSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .binary_search_by(|(k, _)| k.as_str().cmp(name))
            .ok()
            .map(|i| self.0[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a copy with `name` set to `value`, replacing any previous value.
    pub fn with(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        let mut pairs = self.0.clone();
        match pairs.binary_search_by(|(k, _)| k.cmp(&name)) {
            Ok(i) => pairs[i].1 = value,
            Err(i) => pairs.insert(i, (name, value)),
        }
        Self(pairs)
    }

    pub fn without(&self, name: &str) -> Self {
        Self(self.0.iter().filter(|(k, _)| k != name).cloned().collect())
    }

    /// Overlays `other` on top of `self`; labels present in both take `other`'s value.
    pub fn merge(&self, other: &LabelSet) -> Self {
        let mut map = self.to_map();
        for (k, v) in other.iter() {
            map.insert(k.to_string(), v.to_string());
        }
        Self::from(map)
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.0.iter().cloned().collect()
    }
}

impl From<BTreeMap<String, String>> for LabelSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl From<std::collections::HashMap<String, String>> for LabelSet {
    fn from(map: std::collections::HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map: BTreeMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from(map)
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v:?}")?;
        }
        write!(f, "}}")
    }
}

impl Serialize for LabelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for LabelSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, String>::deserialize(deserializer)?;
        Ok(Self::from(map))
    }
}

/// Label names follow `[a-zA-Z_][a-zA-Z0-9_]*`.
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(ls: &LabelSet) -> u64 {
        let mut h = DefaultHasher::new();
        ls.hash(&mut h);
        h.finish()
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a: LabelSet = [("job", "api"), ("instance", "a:9100")].into_iter().collect();
        let b: LabelSet = [("instance", "a:9100"), ("job", "api")].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn different_values_differ() {
        let a: LabelSet = [("job", "api")].into_iter().collect();
        let b: LabelSet = [("job", "db")].into_iter().collect();
        assert_ne!(a, b);
    }

    #[test]
    fn with_replaces_existing() {
        let a: LabelSet = [("job", "api")].into_iter().collect();
        let b = a.with("job", "db").with("env", "prod");
        assert_eq!(b.get("job"), Some("db"));
        assert_eq!(b.get("env"), Some("prod"));
        assert_eq!(a.get("job"), Some("api"));
    }

    #[test]
    fn merge_overlay_wins() {
        let base: LabelSet = [("job", "api"), ("severity", "info")].into_iter().collect();
        let overlay: LabelSet = [("severity", "critical")].into_iter().collect();
        let merged = base.merge(&overlay);
        assert_eq!(merged.get("severity"), Some("critical"));
        assert_eq!(merged.get("job"), Some("api"));
    }

    #[test]
    fn without_drops_label() {
        let a: LabelSet = [("__name__", "up"), ("job", "api")].into_iter().collect();
        let b = a.without(METRIC_NAME_LABEL);
        assert!(!b.contains("__name__"));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn display_is_sorted() {
        let a: LabelSet = [("job", "api"), ("env", "prod")].into_iter().collect();
        assert_eq!(a.to_string(), r#"{env="prod", job="api"}"#);
    }

    #[test]
    fn serializes_as_map() {
        let a: LabelSet = [("job", "api")].into_iter().collect();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"job":"api"}"#);
        let back: LabelSet = serde_json::from_str(r#"{"job":"api"}"#).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn label_name_validation() {
        assert!(is_valid_label_name("job"));
        assert!(is_valid_label_name("_private"));
        assert!(is_valid_label_name("http_code_2"));
        assert!(!is_valid_label_name(""));
        assert!(!is_valid_label_name("2xx"));
        assert!(!is_valid_label_name("bad-name"));
    }
}
