//! ResolutionContext - values shared across placeholders in one session

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::debug;

/// Name→value mapping accumulated over one resolution session
///
/// Seeded by the caller, extended by every resolver's updates, discarded
/// when the session ends. The session clock is captured once so that
/// date/time placeholders give the same answer for the whole session.
///
/// Clones share the value map until one of them writes, so handing each
/// resolver a snapshot does not copy large seeded values.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    values: Arc<BTreeMap<String, String>>,
    now: DateTime<Local>,
}

impl ResolutionContext {
    /// Create an empty context with the clock set to now
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    /// Create an empty context with a fixed clock
    pub fn at(now: DateTime<Local>) -> Self {
        debug!(%now, "ResolutionContext::at: called");
        Self {
            values: Arc::default(),
            now,
        }
    }

    /// Create a context seeded with caller-supplied values
    pub fn seeded<I, K, V>(seed: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ctx = Self::new();
        ctx.merge(seed);
        debug!(count = ctx.len(), "ResolutionContext::seeded: seeded");
        ctx
    }

    /// Get a value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Set a value, replacing any previous one
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        Arc::make_mut(&mut self.values).insert(name.into(), value.into());
    }

    /// A non-empty value for `name`, used to skip recomputation
    pub fn override_for(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Apply a batch of updates in order
    pub fn merge<I, K, V>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in updates {
            self.set(name, value);
        }
    }

    /// Session clock
    pub fn now(&self) -> DateTime<Local> {
        self.now
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Consume the context, keeping only the values
    pub fn into_values(self) -> BTreeMap<String, String> {
        Arc::unwrap_or_clone(self.values)
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_values() {
        let ctx = ResolutionContext::seeded([("input", "world"), ("selectedText", "")]);
        assert_eq!(ctx.get("input"), Some("world"));
        assert_eq!(ctx.get("selectedText"), Some(""));
        assert_eq!(ctx.get("missing"), None);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_override_ignores_empty() {
        let ctx = ResolutionContext::seeded([("a", "x"), ("b", "")]);
        assert_eq!(ctx.override_for("a"), Some("x"));
        assert_eq!(ctx.override_for("b"), None);
        assert_eq!(ctx.override_for("c"), None);
    }

    #[test]
    fn test_merge_later_wins() {
        let mut ctx = ResolutionContext::new();
        ctx.merge([("k", "1"), ("k", "2")]);
        assert_eq!(ctx.get("k"), Some("2"));
    }

    #[test]
    fn test_iter_is_sorted() {
        let ctx = ResolutionContext::seeded([("b", "2"), ("a", "1")]);
        let keys: Vec<&str> = ctx.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_clone_shares_until_written() {
        let mut ctx = ResolutionContext::seeded([("previousResponse", "a long response")]);
        let snapshot = ctx.clone();
        assert!(Arc::ptr_eq(&ctx.values, &snapshot.values));

        ctx.set("previousResponse", "changed");
        assert!(!Arc::ptr_eq(&ctx.values, &snapshot.values));
        assert_eq!(snapshot.get("previousResponse"), Some("a long response"));
        assert_eq!(ctx.get("previousResponse"), Some("changed"));
        assert_eq!(snapshot.into_values().len(), 1);
    }

    #[test]
    fn test_clock_is_fixed() {
        let ctx = ResolutionContext::new();
        let clone = ctx.clone();
        assert_eq!(ctx.now(), clone.now());
    }
}
