//! Custom placeholders - user-authored pattern/template pairs
//!
//! The persisted file is a JSON object keyed by regex pattern:
//!
//! ```json
//! {
//!   "\\{\\{greet:(\\w+)\\}\\}": {
//!     "name": "greet",
//!     "value": "Hello, $1!",
//!     "description": "Greets someone by name",
//!     "example": "{{greet:Ada}}"
//!   }
//! }
//! ```
//!
//! `$0`, `$1`, ... in `value` are replaced by the pattern's capture groups.
//! Entries are compiled in file order and registered after the built-ins.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Effect, Origin, PlaceholderDefinition, PlaceholderMatch, Resolution, ResolutionFailure, Resolver};
use crate::engine::{ResolutionContext, ResolutionWarning};

/// One persisted entry, without its pattern key
#[derive(Debug, Clone, Deserialize, Serialize)]
struct CustomPlaceholderEntry {
    name: String,
    value: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    example: String,
}

/// A user-authored placeholder as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomPlaceholder {
    pub name: String,
    pub pattern_source: String,
    pub template: String,
    pub description: String,
    pub example: String,
}

impl CustomPlaceholder {
    /// Compile into a registry definition
    pub fn compile(self) -> Result<PlaceholderDefinition, ResolutionWarning> {
        debug!(name = %self.name, pattern = %self.pattern_source, "CustomPlaceholder::compile: called");
        let pattern = Regex::new(&self.pattern_source).map_err(|e| ResolutionWarning::InvalidPattern {
            name: self.name.clone(),
            pattern: self.pattern_source.clone(),
            reason: e.to_string(),
        })?;

        Ok(PlaceholderDefinition {
            resolver: Arc::new(CustomResolver {
                name: self.name.clone(),
                template: self.template,
            }),
            name: self.name,
            pattern,
            effect: Effect::Pure,
            constant: false,
            description: self.description,
            example: self.example,
            origin: Origin::Custom,
        })
    }
}

/// Substitutes capture groups into a custom placeholder's template
struct CustomResolver {
    name: String,
    template: String,
}

#[async_trait]
impl Resolver for CustomResolver {
    async fn resolve(&self, matched: &PlaceholderMatch, ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        debug!(name = %self.name, "CustomResolver::resolve: called");
        if let Some(value) = ctx.override_for(&self.name) {
            debug!("CustomResolver::resolve: using context override");
            return Ok(Resolution::text(value));
        }
        let result = expand_template(&self.template, &matched.groups);
        Ok(Resolution::published(&self.name, result))
    }
}

/// Replace `$N` with capture group `N`
///
/// Captured text is inserted literally: a `$` or `\` inside a capture is
/// never read as another reference. Missing groups expand to `""`; a `$`
/// not followed by a digit is kept.
pub fn expand_template(template: &str, groups: &[Option<String>]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let digits_start = i + 1;
        let mut digits_end = digits_start;
        while let Some(&(j, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits_end = j + 1;
            chars.next();
        }

        if digits_end == digits_start {
            out.push('$');
            continue;
        }

        let group = template[digits_start..digits_end]
            .parse::<usize>()
            .ok()
            .and_then(|n| groups.get(n))
            .and_then(|g| g.as_deref())
            .unwrap_or("");
        out.push_str(group);
    }

    out
}

/// Result of loading custom placeholders
#[derive(Debug, Default)]
pub struct LoadReport {
    pub placeholders: Vec<PlaceholderDefinition>,
    pub warnings: Vec<ResolutionWarning>,
}

/// Reads and compiles the persisted custom placeholder file
pub struct CustomPlaceholderLoader;

impl CustomPlaceholderLoader {
    /// Load from a file; a missing file means no custom placeholders
    pub fn load_file(path: &Path) -> LoadReport {
        debug!(?path, "CustomPlaceholderLoader::load_file: called");
        if !path.exists() {
            debug!("CustomPlaceholderLoader::load_file: no custom placeholder file");
            return LoadReport::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let report = Self::load_str(&content);
                info!(
                    "Loaded {} custom placeholders from {} ({} warnings)",
                    report.placeholders.len(),
                    path.display(),
                    report.warnings.len()
                );
                report
            }
            Err(e) => {
                warn!(?path, error = %e, "Failed to read custom placeholders");
                LoadReport {
                    placeholders: Vec::new(),
                    warnings: vec![ResolutionWarning::MalformedCustomPlaceholders {
                        reason: format!("{}: {}", path.display(), e),
                    }],
                }
            }
        }
    }

    /// Load from JSON text
    pub fn load_str(json: &str) -> LoadReport {
        debug!(len = json.len(), "CustomPlaceholderLoader::load_str: called");
        let (entries, mut warnings) = Self::parse(json);
        let mut placeholders = Vec::with_capacity(entries.len());

        for entry in entries {
            match entry.compile() {
                Ok(def) => placeholders.push(def),
                Err(warning) => {
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        LoadReport { placeholders, warnings }
    }

    /// Parse entries without compiling their patterns
    pub fn parse(json: &str) -> (Vec<CustomPlaceholder>, Vec<ResolutionWarning>) {
        debug!("CustomPlaceholderLoader::parse: called");
        let root: Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => {
                debug!(%e, "CustomPlaceholderLoader::parse: not valid JSON");
                return (
                    Vec::new(),
                    vec![ResolutionWarning::MalformedCustomPlaceholders { reason: e.to_string() }],
                );
            }
        };

        let Value::Object(map) = root else {
            debug!("CustomPlaceholderLoader::parse: root is not an object");
            return (
                Vec::new(),
                vec![ResolutionWarning::MalformedCustomPlaceholders {
                    reason: "expected a JSON object keyed by pattern".to_string(),
                }],
            );
        };

        let mut entries = Vec::with_capacity(map.len());
        let mut warnings = Vec::new();

        for (pattern_source, value) in map {
            match serde_json::from_value::<CustomPlaceholderEntry>(value) {
                Ok(entry) => entries.push(CustomPlaceholder {
                    name: entry.name,
                    pattern_source,
                    template: entry.value,
                    description: entry.description,
                    example: entry.example,
                }),
                Err(e) => {
                    debug!(%pattern_source, %e, "CustomPlaceholderLoader::parse: malformed entry");
                    warnings.push(ResolutionWarning::MalformedCustomPlaceholders {
                        reason: format!("entry '{}': {}", pattern_source, e),
                    });
                }
            }
        }

        (entries, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn groups(items: &[&str]) -> Vec<Option<String>> {
        items.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn test_expand_template_basic() {
        assert_eq!(expand_template("Got: $1", &groups(&["CUSTOM_foo", "foo"])), "Got: foo");
        assert_eq!(expand_template("$0!", &groups(&["all"])), "all!");
    }

    #[test]
    fn test_expand_template_multi_digit_and_missing() {
        let mut g = groups(&["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "ten"]);
        assert_eq!(expand_template("$10|$1", &g), "ten|1");
        g.truncate(2);
        assert_eq!(expand_template("[$5]", &g), "[]");
    }

    #[test]
    fn test_expand_template_non_participating_group() {
        let g = vec![Some("x".to_string()), None];
        assert_eq!(expand_template("<$1>", &g), "<>");
    }

    #[test]
    fn test_expand_template_literal_dollar() {
        assert_eq!(expand_template("cost: $ and $x", &groups(&["m"])), "cost: $ and $x");
        assert_eq!(expand_template("end$", &groups(&["m"])), "end$");
    }

    #[test]
    fn test_expand_template_capture_inserted_literally() {
        let g = groups(&["m", r"C:\path\$2", "SECRET"]);
        assert_eq!(expand_template("[$1]", &g), r"[C:\path\$2]");
    }

    #[test]
    fn test_load_valid_and_invalid() {
        let json = r#"{
            "CUSTOM_(\\w+)": { "name": "custom", "value": "Got: $1", "description": "d", "example": "CUSTOM_x" },
            "broken(": { "name": "broken", "value": "x" }
        }"#;

        let report = CustomPlaceholderLoader::load_str(json);
        assert_eq!(report.placeholders.len(), 1);
        assert_eq!(report.placeholders[0].name, "custom");
        assert_eq!(report.placeholders[0].origin, Origin::Custom);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            &report.warnings[0],
            ResolutionWarning::InvalidPattern { name, .. } if name == "broken"
        ));
    }

    #[test]
    fn test_load_preserves_file_order() {
        let json = r#"{
            "zeta": { "name": "z", "value": "1" },
            "alpha": { "name": "a", "value": "2" },
            "mid": { "name": "m", "value": "3" }
        }"#;

        let report = CustomPlaceholderLoader::load_str(json);
        let names: Vec<&str> = report.placeholders.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_load_malformed_file() {
        let report = CustomPlaceholderLoader::load_str("{ not json");
        assert!(report.placeholders.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            report.warnings[0],
            ResolutionWarning::MalformedCustomPlaceholders { .. }
        ));
    }

    #[test]
    fn test_load_non_object_root() {
        let report = CustomPlaceholderLoader::load_str("[1, 2]");
        assert!(report.placeholders.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_load_malformed_entry_skipped() {
        let json = r#"{
            "ok": { "name": "ok", "value": "fine" },
            "bad": { "value": "no name" },
            "worse": 42
        }"#;

        let report = CustomPlaceholderLoader::load_str(json);
        assert_eq!(report.placeholders.len(), 1);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_load_file_missing_is_empty() {
        let temp = tempdir().unwrap();
        let report = CustomPlaceholderLoader::load_file(&temp.path().join("nope.json"));
        assert!(report.placeholders.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_load_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("custom.json");
        fs::write(&path, r#"{ "X_(\\d+)": { "name": "x", "value": "n=$1" } }"#).unwrap();

        let report = CustomPlaceholderLoader::load_file(&path);
        assert_eq!(report.placeholders.len(), 1);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_custom_resolver_substitutes() {
        let def = CustomPlaceholder {
            name: "custom".to_string(),
            pattern_source: r"CUSTOM_(\w+)".to_string(),
            template: "Got: $1".to_string(),
            description: String::new(),
            example: String::new(),
        }
        .compile()
        .unwrap();

        let m = def.match_at("CUSTOM_foo bar", 0).unwrap();
        let r = def.resolver.resolve(&m, &ResolutionContext::new()).await.unwrap();
        assert_eq!(r.text, "Got: foo");
        assert_eq!(r.updates, vec![("custom".to_string(), "Got: foo".to_string())]);
    }

    #[tokio::test]
    async fn test_custom_resolver_override() {
        let def = CustomPlaceholder {
            name: "custom".to_string(),
            pattern_source: r"CUSTOM_(\w+)".to_string(),
            template: "Got: $1".to_string(),
            description: String::new(),
            example: String::new(),
        }
        .compile()
        .unwrap();

        let ctx = ResolutionContext::seeded([("custom", "preset")]);
        let m = def.match_at("CUSTOM_foo", 0).unwrap();
        let r = def.resolver.resolve(&m, &ctx).await.unwrap();
        assert_eq!(r.text, "preset");
        assert!(r.updates.is_empty());
    }
}
