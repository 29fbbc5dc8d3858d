//! Command launching for `{{cmd:...}}`

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::{CommandLauncher, ExecutionError};

/// A request to open another command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchRequest {
    pub command: String,
    pub input: String,
}

/// Records launch requests for the caller to act on after resolution
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    requests: Mutex<Vec<LaunchRequest>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        debug!("RecordingLauncher::new: called");
        Self::default()
    }

    /// Launch requests received so far, in order
    pub fn requests(&self) -> Vec<LaunchRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl CommandLauncher for RecordingLauncher {
    async fn launch(&self, command: &str, input: &str) -> Result<(), ExecutionError> {
        debug!(%command, input_len = input.len(), "RecordingLauncher::launch: called");
        if command.trim().is_empty() {
            return Err(ExecutionError::Launch("command name is empty".to_string()));
        }

        info!("Queued command launch: {}", command);
        let request = LaunchRequest {
            command: command.to_string(),
            input: input.to_string(),
        };
        match self.requests.lock() {
            Ok(mut guard) => guard.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
        Ok(())
    }
}
