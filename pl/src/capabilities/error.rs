//! Capability error types

use thiserror::Error;

/// Errors from running a script or launching a command
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Script exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Script timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not supported on this system")]
    Unsupported(String),

    #[error("Command launch failed: {0}")]
    Launch(String),
}

/// Errors from fetching a remote resource
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL must start with http:// or https://: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch URL: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),

    #[error("Response too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("URL fetching is not available")]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_message() {
        let err = ExecutionError::NonZeroExit {
            code: 2,
            stderr: "boom".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("2"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_too_large_message() {
        let err = FetchError::TooLarge {
            size: 2_000_000,
            limit: 1_000_000,
        };

        let msg = err.to_string();
        assert!(msg.contains("2000000"));
        assert!(msg.contains("1000000"));
    }
}
