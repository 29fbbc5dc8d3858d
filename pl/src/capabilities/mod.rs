//! Capability adapters consumed by effectful placeholders
//!
//! The resolution engine never runs processes or opens sockets itself. It
//! talks to four narrow traits, bundled in [`Capabilities`]:
//!
//! - [`ScriptExecutor`] - runs shell / AppleScript / JXA text
//! - [`ResourceFetcher`] - fetches a URL and extracts its text
//! - [`FileEnumerator`] - lists the files the user has selected
//! - [`CommandLauncher`] - opens another command with some input
//!
//! Default adapters for the `pl` binary live alongside the traits.

mod error;
mod fetch;
mod files;
mod launcher;
mod script;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

pub use error::{ExecutionError, FetchError};
pub use fetch::{HttpFetcher, NoFetch};
pub use files::StaticFileEnumerator;
pub use launcher::{LaunchRequest, RecordingLauncher};
pub use script::{NoScripts, ProcessScriptExecutor, ScriptKind};

use crate::config::Config;

/// Runs script text of a given kind and returns its output
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn run(&self, kind: ScriptKind, script: &str) -> Result<String, ExecutionError>;
}

/// Fetches a URL and returns its visible text
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Lists the currently selected files, in selection order
#[async_trait]
pub trait FileEnumerator: Send + Sync {
    async fn list_selected(&self) -> Vec<PathBuf>;
}

/// Opens another command with the supplied input
#[async_trait]
pub trait CommandLauncher: Send + Sync {
    async fn launch(&self, command: &str, input: &str) -> Result<(), ExecutionError>;
}

/// The set of capabilities handed to built-in placeholders
#[derive(Clone)]
pub struct Capabilities {
    pub scripts: Arc<dyn ScriptExecutor>,
    pub fetcher: Arc<dyn ResourceFetcher>,
    pub files: Arc<dyn FileEnumerator>,
    pub launcher: Arc<dyn CommandLauncher>,
}

impl Capabilities {
    /// Process scripts, HTTP fetching, no selected files, recording launcher
    pub fn from_config(config: &Config) -> Self {
        debug!("Capabilities::from_config: called");
        Self {
            scripts: Arc::new(ProcessScriptExecutor::from_config(&config.scripts)),
            fetcher: Arc::new(HttpFetcher::from_config(&config.fetch)),
            files: Arc::new(StaticFileEnumerator::default()),
            launcher: Arc::new(RecordingLauncher::new()),
        }
    }

    /// Capabilities that refuse every effectful action (for tests and sandboxes)
    pub fn inert() -> Self {
        debug!("Capabilities::inert: called");
        Self {
            scripts: Arc::new(NoScripts),
            fetcher: Arc::new(NoFetch),
            files: Arc::new(StaticFileEnumerator::default()),
            launcher: Arc::new(RecordingLauncher::new()),
        }
    }

    pub fn with_scripts(mut self, scripts: Arc<dyn ScriptExecutor>) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_files(mut self, files: Arc<dyn FileEnumerator>) -> Self {
        self.files = files;
        self
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn CommandLauncher>) -> Self {
        self.launcher = launcher;
        self
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
