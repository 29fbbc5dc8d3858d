//! Script execution backed by child processes

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{ExecutionError, ScriptExecutor};
use crate::config::ScriptsConfig;

/// The language a directive's script is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    /// POSIX shell (`{{shell:...}}`)
    Shell,
    /// AppleScript (`{{as:...}}`)
    AppleScript,
    /// JavaScript for Automation (`{{js:...}}`)
    JavaScript,
}

impl std::fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shell => write!(f, "shell"),
            Self::AppleScript => write!(f, "AppleScript"),
            Self::JavaScript => write!(f, "JavaScript"),
        }
    }
}

/// Runs scripts as child processes with a timeout
pub struct ProcessScriptExecutor {
    shell: String,
    timeout_ms: u64,
    max_output_chars: usize,
}

impl ProcessScriptExecutor {
    pub fn from_config(config: &ScriptsConfig) -> Self {
        debug!(?config, "ProcessScriptExecutor::from_config: called");
        Self {
            shell: config.shell.clone(),
            timeout_ms: config.timeout_ms,
            max_output_chars: config.max_output_chars,
        }
    }

    /// Program and arguments for a script of the given kind
    fn command_line(&self, kind: ScriptKind, script: &str) -> Result<(String, Vec<String>), ExecutionError> {
        debug!(%kind, "ProcessScriptExecutor::command_line: called");
        match kind {
            ScriptKind::Shell => Ok((self.shell.clone(), vec!["-c".to_string(), script.to_string()])),
            ScriptKind::AppleScript if cfg!(target_os = "macos") => {
                Ok(("osascript".to_string(), vec!["-e".to_string(), script.to_string()]))
            }
            ScriptKind::JavaScript if cfg!(target_os = "macos") => Ok((
                "osascript".to_string(),
                vec![
                    "-l".to_string(),
                    "JavaScript".to_string(),
                    "-e".to_string(),
                    script.to_string(),
                ],
            )),
            _ => {
                debug!("ProcessScriptExecutor::command_line: kind unsupported on this platform");
                Err(ExecutionError::Unsupported(kind.to_string()))
            }
        }
    }
}

impl Default for ProcessScriptExecutor {
    fn default() -> Self {
        Self::from_config(&ScriptsConfig::default())
    }
}

#[async_trait]
impl ScriptExecutor for ProcessScriptExecutor {
    async fn run(&self, kind: ScriptKind, script: &str) -> Result<String, ExecutionError> {
        debug!(%kind, script_len = script.len(), "ProcessScriptExecutor::run: called");
        let (program, args) = self.command_line(kind, script)?;

        let output = match tokio::time::timeout(
            Duration::from_millis(self.timeout_ms),
            tokio::process::Command::new(&program)
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        {
            Ok(Ok(output)) => {
                debug!(status = ?output.status, "ProcessScriptExecutor::run: script completed");
                output
            }
            Ok(Err(source)) => {
                debug!(%source, "ProcessScriptExecutor::run: failed to spawn");
                return Err(ExecutionError::Spawn { program, source });
            }
            Err(_) => {
                debug!("ProcessScriptExecutor::run: script timed out");
                return Err(ExecutionError::Timeout {
                    timeout_ms: self.timeout_ms,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(exit_code = ?output.status.code(), "ProcessScriptExecutor::run: script failed");
            return Err(ExecutionError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim_end_matches(['\n', '\r']);

        if trimmed.chars().count() > self.max_output_chars {
            debug!("ProcessScriptExecutor::run: truncating long output");
            return Ok(trimmed.chars().take(self.max_output_chars).collect());
        }

        Ok(trimmed.to_string())
    }
}

/// Refuses every script
pub struct NoScripts;

#[async_trait]
impl ScriptExecutor for NoScripts {
    async fn run(&self, kind: ScriptKind, _script: &str) -> Result<String, ExecutionError> {
        debug!(%kind, "NoScripts::run: called");
        Err(ExecutionError::Unsupported(format!("{} scripts", kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shell_basic() {
        let executor = ProcessScriptExecutor::default();
        let output = executor.run(ScriptKind::Shell, "echo hello").await.unwrap();
        assert_eq!(output, "hello");
    }

    #[tokio::test]
    async fn test_shell_keeps_inner_newlines() {
        let executor = ProcessScriptExecutor::default();
        let output = executor.run(ScriptKind::Shell, "printf 'a\\nb\\n'").await.unwrap();
        assert_eq!(output, "a\nb");
    }

    #[tokio::test]
    async fn test_shell_failure() {
        let executor = ProcessScriptExecutor::default();
        let err = executor.run(ScriptKind::Shell, "echo oops >&2; exit 3").await.unwrap_err();
        match err {
            ExecutionError::NonZeroExit { code, stderr } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_shell_timeout() {
        let executor = ProcessScriptExecutor::from_config(&ScriptsConfig {
            timeout_ms: 50,
            ..Default::default()
        });
        let err = executor.run(ScriptKind::Shell, "sleep 5").await.unwrap_err();
        assert!(matches!(err, ExecutionError::Timeout { timeout_ms: 50 }));
    }

    #[tokio::test]
    async fn test_output_truncated() {
        let executor = ProcessScriptExecutor::from_config(&ScriptsConfig {
            max_output_chars: 3,
            ..Default::default()
        });
        let output = executor.run(ScriptKind::Shell, "echo abcdef").await.unwrap();
        assert_eq!(output, "abc");
    }

    #[tokio::test]
    async fn test_missing_shell() {
        let executor = ProcessScriptExecutor::from_config(&ScriptsConfig {
            shell: "/nonexistent/shell".to_string(),
            ..Default::default()
        });
        let err = executor.run(ScriptKind::Shell, "true").await.unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
    }

    #[cfg(not(target_os = "macos"))]
    #[tokio::test]
    async fn test_applescript_unsupported_off_macos() {
        let executor = ProcessScriptExecutor::default();
        let err = executor.run(ScriptKind::AppleScript, "return 1").await.unwrap_err();
        assert!(matches!(err, ExecutionError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_no_scripts() {
        let err = NoScripts.run(ScriptKind::Shell, "echo hi").await.unwrap_err();
        assert!(err.to_string().contains("shell"));
    }
}
