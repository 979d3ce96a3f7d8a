//! Per-request server settings.
//!
//! Settings travel out-of-band as URL query pairs (`?max_threads=4&...`).
//! A client may carry defaults which individual calls override key by key.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Server settings keyed by name, ordered for stable URLs.
///
/// ```rust
/// use clickhouse_link::Settings;
///
/// let settings = Settings::new()
///     .with("max_threads", 4)
///     .with("output_format_arrow_string_as_string", 1);
/// assert_eq!(settings.get("max_threads"), Some("4"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, String>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Settings::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Display) -> Option<String> {
        self.0.insert(key.into(), value.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
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

    /// Union of both maps; `overrides` wins on shared keys.
    pub fn merged_with(&self, overrides: &Settings) -> Settings {
        let mut merged = self.0.clone();
        merged.extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Settings(merged)
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Self::new();
        for (key, value) in iter {
            settings.set(key, value);
        }
        settings
    }
}

impl<K: Into<String>, V: Display, const N: usize> From<[(K, V); N]> for Settings {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for Settings {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Combine client defaults with per-call settings.
///
/// Returns `None` when neither side is present and borrows the present side
/// unchanged when only one is; only an actual merge allocates.
pub fn merge_settings<'a>(
    defaults: Option<&'a Settings>,
    overrides: Option<&'a Settings>,
) -> Option<Cow<'a, Settings>> {
    match (defaults, overrides) {
        (None, None) => None,
        (Some(defaults), None) => Some(Cow::Borrowed(defaults)),
        (None, Some(overrides)) => Some(Cow::Borrowed(overrides)),
        (Some(defaults), Some(overrides)) => Some(Cow::Owned(defaults.merged_with(overrides))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_neither() {
        assert!(merge_settings(None, None).is_none());
    }

    #[test]
    fn test_merge_one_side_is_borrowed() {
        let s = Settings::from([("limit", 1)]);

        let merged = merge_settings(None, Some(&s)).unwrap();
        assert!(matches!(merged, Cow::Borrowed(_)));
        assert_eq!(*merged, s);

        let merged = merge_settings(Some(&s), None).unwrap();
        assert!(matches!(merged, Cow::Borrowed(_)));
        assert_eq!(*merged, s);
    }

    #[test]
    fn test_merge_overrides_win() {
        let defaults = Settings::from([("limit", 10), ("max_threads", 2)]);
        let overrides = Settings::from([("limit", 1), ("readonly", 1)]);

        let merged = merge_settings(Some(&defaults), Some(&overrides)).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("limit"), Some("1"));
        assert_eq!(merged.get("max_threads"), Some("2"));
        assert_eq!(merged.get("readonly"), Some("1"));
        // inputs untouched
        assert_eq!(defaults.get("limit"), Some("10"));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let settings = Settings::new().with("b", "x").with("a", true);
        let keys: Vec<_> = settings.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(settings.get("a"), Some("true"));
    }

    #[test]
    fn test_deserialize_from_json_map() {
        let settings: Settings = serde_json::from_str(r#"{"limit":"5"}"#).unwrap();
        assert_eq!(settings.get("limit"), Some("5"));
    }
}
