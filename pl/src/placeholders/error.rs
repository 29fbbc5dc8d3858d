//! Resolver failure types

use thiserror::Error;

use crate::capabilities::{ExecutionError, FetchError};

/// Why a single placeholder could not be resolved
///
/// The engine turns every failure into a warning and substitutes an empty
/// string, so these never escape a resolution session.
#[derive(Debug, Error)]
pub enum ResolutionFailure {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resolver task ended unexpectedly: {0}")]
    Aborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_is_transparent() {
        let failure: ResolutionFailure = ExecutionError::Timeout { timeout_ms: 10 }.into();
        assert_eq!(failure.to_string(), "Script timed out after 10ms");
    }

    #[test]
    fn test_read_message_has_path() {
        let failure = ResolutionFailure::Read {
            path: "/nope".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(failure.to_string().contains("/nope"));
    }
}
