//! Non-fatal problems reported alongside resolved text

use serde::Serialize;
use thiserror::Error;

use crate::placeholders::Effect;

/// A problem that did not stop resolution
///
/// Tokens that match no placeholder are left verbatim and are never
/// reported here.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionWarning {
    /// A custom placeholder's pattern failed to compile; the entry was skipped
    #[error("Invalid pattern for custom placeholder '{name}' ({pattern}): {reason}")]
    InvalidPattern {
        name: String,
        pattern: String,
        reason: String,
    },

    /// A resolver failed; its token was replaced with an empty string
    #[error("Placeholder '{placeholder}' failed: {message}")]
    DirectiveExecutionFailure {
        placeholder: String,
        effect: Effect,
        message: String,
    },

    /// Tokens remained after the final pass
    #[error("Stopped after {passes} passes with placeholders still unresolved")]
    RecursionLimitExceeded { passes: usize },

    /// The custom placeholder file (or one entry of it) could not be read
    #[error("Malformed custom placeholders: {reason}")]
    MalformedCustomPlaceholders { reason: String },

    /// A placeholder name was registered twice; the later one was skipped
    #[error("Duplicate placeholder '{name}' skipped")]
    DuplicatePlaceholder { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let w = ResolutionWarning::RecursionLimitExceeded { passes: 5 };
        assert!(w.to_string().contains("5 passes"));

        let w = ResolutionWarning::DirectiveExecutionFailure {
            placeholder: "shell".to_string(),
            effect: Effect::Effectful,
            message: "exit 1".to_string(),
        };
        assert!(w.to_string().contains("'shell'"));
        assert!(w.to_string().contains("exit 1"));
    }

    #[test]
    fn test_serialize_tagged() {
        let w = ResolutionWarning::DuplicatePlaceholder { name: "date".to_string() };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["kind"], "duplicate_placeholder");
        assert_eq!(json["name"], "date");
    }
}
