//! PlaceholderDefinition - the uniform record for built-in and custom resolvers

use std::sync::Arc;

use async_trait::async_trait;
use regex::{Captures, Regex};
use serde::Serialize;

use super::ResolutionFailure;
use crate::engine::ResolutionContext;

/// Whether a placeholder acts on the world or only computes a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Side-effect free; seeded context values take precedence
    Pure,
    /// Performs an action (script, fetch, launch); re-runs on every occurrence
    Effectful,
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pure => write!(f, "pure"),
            Self::Effectful => write!(f, "effectful"),
        }
    }
}

/// Where a definition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Builtin,
    Custom,
}

/// One match of a placeholder pattern in the template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMatch {
    /// Full matched text
    pub text: String,
    /// Byte offset of the match in the text being scanned
    pub start: usize,
    /// Capture groups; index 0 is the whole match
    pub groups: Vec<Option<String>>,
}

impl PlaceholderMatch {
    pub fn from_captures(caps: &Captures<'_>) -> Self {
        let whole = caps.get(0);
        Self {
            text: whole.map(|m| m.as_str().to_string()).unwrap_or_default(),
            start: whole.map(|m| m.start()).unwrap_or_default(),
            groups: caps.iter().map(|g| g.map(|m| m.as_str().to_string())).collect(),
        }
    }

    /// Capture group `index`, or `""` when it did not participate
    pub fn group(&self, index: usize) -> &str {
        self.groups.get(index).and_then(|g| g.as_deref()).unwrap_or("")
    }
}

/// Replacement text plus the context values later resolvers should see
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub text: String,
    pub updates: Vec<(String, String)>,
}

impl Resolution {
    /// Replacement text with no context updates
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            updates: Vec::new(),
        }
    }

    /// Replacement text that is also published under `name`
    pub fn published(name: &str, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            updates: vec![(name.to_string(), text.clone())],
            text,
        }
    }

    /// Add a context update
    pub fn with_update(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.updates.push((name.into(), value.into()));
        self
    }
}

/// Turns a placeholder match into replacement text
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, matched: &PlaceholderMatch, ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure>;
}

/// A named, ordered resolver entry in the registry
#[derive(Clone)]
pub struct PlaceholderDefinition {
    pub name: String,
    pub pattern: Regex,
    pub effect: Effect,
    /// Same match text always yields the same result within a session
    pub constant: bool,
    pub description: String,
    pub example: String,
    pub origin: Origin,
    pub resolver: Arc<dyn Resolver>,
}

impl PlaceholderDefinition {
    /// Leftmost non-empty match at or after `from`
    ///
    /// Empty matches are stepped over so a pattern like `a*` cannot stall a scan.
    pub fn find_at(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        let mut pos = from;
        while pos <= text.len() {
            let m = self.pattern.find_at(text, pos)?;
            if !m.is_empty() {
                return Some((m.start(), m.end()));
            }
            pos = next_char_boundary(text, m.start());
        }
        None
    }

    /// Captures for a match known to start at `start`
    pub fn match_at(&self, text: &str, start: usize) -> Option<PlaceholderMatch> {
        self.pattern.captures_at(text, start).map(|caps| PlaceholderMatch::from_captures(&caps))
    }

    /// Whether the pattern matches anywhere in `text`
    pub fn matches(&self, text: &str) -> bool {
        self.find_at(text, 0).is_some()
    }
}

impl std::fmt::Debug for PlaceholderDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderDefinition")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("effect", &self.effect)
            .field("constant", &self.constant)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    text[from..].chars().next().map(|c| from + c.len_utf8()).unwrap_or(text.len() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Resolver for Echo {
        async fn resolve(
            &self,
            matched: &PlaceholderMatch,
            _ctx: &ResolutionContext,
        ) -> Result<Resolution, ResolutionFailure> {
            Ok(Resolution::text(matched.group(1)))
        }
    }

    fn def(pattern: &str) -> PlaceholderDefinition {
        PlaceholderDefinition {
            name: "echo".to_string(),
            pattern: Regex::new(pattern).unwrap(),
            effect: Effect::Pure,
            constant: true,
            description: String::new(),
            example: String::new(),
            origin: Origin::Builtin,
            resolver: Arc::new(Echo),
        }
    }

    #[test]
    fn test_find_at_skips_empty_matches() {
        let d = def("a*");
        assert_eq!(d.find_at("bbaab", 0), Some((2, 4)));
        assert_eq!(d.find_at("bbb", 0), None);
        assert!(!d.matches(""));
    }

    #[test]
    fn test_find_at_multibyte() {
        let d = def("x*");
        assert_eq!(d.find_at("ééx", 0), Some((4, 5)));
    }

    #[test]
    fn test_match_at_groups() {
        let d = def(r"\{\{echo:(\w+)\}\}");
        let text = "say {{echo:hi}}";
        let (start, _) = d.find_at(text, 0).unwrap();
        let m = d.match_at(text, start).unwrap();
        assert_eq!(m.text, "{{echo:hi}}");
        assert_eq!(m.start, 4);
        assert_eq!(m.group(1), "hi");
        assert_eq!(m.group(7), "");
    }

    #[test]
    fn test_resolution_published() {
        let r = Resolution::published("date", "today").with_update("extra", "1");
        assert_eq!(r.text, "today");
        assert_eq!(
            r.updates,
            vec![
                ("date".to_string(), "today".to_string()),
                ("extra".to_string(), "1".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_resolver_trait_object() {
        let d = def(r"\{\{echo:(\w+)\}\}");
        let m = d.match_at("{{echo:yo}}", 0).unwrap();
        let r = d.resolver.resolve(&m, &ResolutionContext::new()).await.unwrap();
        assert_eq!(r.text, "yo");
    }
}
