//! Effectful directives: scripts, URL fetches, command launches
//!
//! Directives never consult the context for an override and are never
//! cached: their purpose is the action, so every occurrence runs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::capabilities::{CommandLauncher, ResourceFetcher, ScriptExecutor, ScriptKind};
use crate::engine::ResolutionContext;
use crate::placeholders::{PlaceholderMatch, Resolution, ResolutionFailure, Resolver};

/// `{{shell:...}}`, `{{as:...}}`, `{{js:...}}`
pub struct ScriptResolver {
    kind: ScriptKind,
    scripts: Arc<dyn ScriptExecutor>,
}

impl ScriptResolver {
    pub fn new(kind: ScriptKind, scripts: Arc<dyn ScriptExecutor>) -> Self {
        Self { kind, scripts }
    }
}

#[async_trait]
impl Resolver for ScriptResolver {
    async fn resolve(&self, matched: &PlaceholderMatch, _ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        let script = matched.group(1);
        debug!(kind = %self.kind, script_len = script.len(), "ScriptResolver::resolve: called");
        if script.trim().is_empty() {
            return Err(ResolutionFailure::InvalidArgument(format!("{} script is empty", self.kind)));
        }
        info!("Running {} directive", self.kind);
        let output = self.scripts.run(self.kind, script).await?;
        Ok(Resolution::text(output))
    }
}

/// `{{url:...}}` and bare `{{https://...}}`
pub struct UrlResolver {
    fetcher: Arc<dyn ResourceFetcher>,
}

impl UrlResolver {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Resolver for UrlResolver {
    async fn resolve(&self, matched: &PlaceholderMatch, _ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        let url = matched.group(1).trim();
        debug!(%url, "UrlResolver::resolve: called");
        info!("Fetching {}", url);
        let text = self.fetcher.fetch_text(url).await?;
        Ok(Resolution::text(text))
    }
}

/// `{{cmd:NAME}}` / `{{cmd:NAME:INPUT}}` - open another command
///
/// Always yields an empty string.
pub struct LaunchResolver {
    launcher: Arc<dyn CommandLauncher>,
}

impl LaunchResolver {
    pub fn new(launcher: Arc<dyn CommandLauncher>) -> Self {
        Self { launcher }
    }
}

#[async_trait]
impl Resolver for LaunchResolver {
    async fn resolve(&self, matched: &PlaceholderMatch, _ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        let command = matched.group(1).trim();
        let input = matched.group(2);
        debug!(%command, input_len = input.len(), "LaunchResolver::resolve: called");
        self.launcher.launch(command, input).await?;
        Ok(Resolution::text(""))
    }
}
