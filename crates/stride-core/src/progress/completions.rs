//! The [`CompletionMap`]: which plan days are marked done.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Day identity to done flag.
///
/// Entries are only ever upserted. Un-marking a day stores `false`
/// rather than removing the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionMap(BTreeMap<String, bool>);

impl CompletionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the day is marked done. Unknown days are not done.
    pub fn is_done(&self, day_id: &str) -> bool {
        self.0.get(day_id).copied().unwrap_or(false)
    }

    /// The stored flag, if the day has ever been written.
    pub fn get(&self, day_id: &str) -> Option<bool> {
        self.0.get(day_id).copied()
    }

    pub fn set(&mut self, day_id: impl Into<String>, done: bool) {
        self.0.insert(day_id.into(), done);
    }

    /// Flip the flag for a day and return the new value.
    pub fn toggle(&mut self, day_id: &str) -> bool {
        let next = !self.is_done(day_id);
        self.set(day_id, next);
        next
    }

    /// Number of entries set to `true`, across the whole map.
    pub fn done_count(&self) -> usize {
        self.0.values().filter(|done| **done).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(id, done)| (id.as_str(), *done))
    }
}

impl From<BTreeMap<String, bool>> for CompletionMap {
    fn from(map: BTreeMap<String, bool>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for CompletionMap {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_day_is_not_done() {
        let map = CompletionMap::new();
        assert!(!map.is_done("Jan 5-Mon"));
        assert_eq!(map.get("Jan 5-Mon"), None);
    }

    #[test]
    fn toggle_to_false_keeps_the_entry() {
        let mut map = CompletionMap::new();
        assert!(map.toggle("a"));
        assert!(!map.toggle("a"));
        assert_eq!(map.get("a"), Some(false));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn done_count_ignores_false_entries() {
        let map: CompletionMap = [("a", true), ("b", false), ("c", true)]
            .into_iter()
            .collect();
        assert_eq!(map.done_count(), 2);
    }

    #[test]
    fn json_form_is_a_plain_object() {
        let map: CompletionMap = [("Jan 5-Mon", true)].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Jan 5-Mon":true}"#);
        let back: CompletionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
