//! File placeholders: selected file list, selected file contents, `{{file:...}}`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use crate::capabilities::FileEnumerator;
use crate::engine::ResolutionContext;
use crate::placeholders::{PlaceholderMatch, Resolution, ResolutionFailure, Resolver};

/// `{{selectedFiles}}` - selected paths joined by `, `
pub struct SelectedFilesResolver {
    files: Arc<dyn FileEnumerator>,
}

impl SelectedFilesResolver {
    pub const NAME: &'static str = "selectedFiles";

    pub fn new(files: Arc<dyn FileEnumerator>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl Resolver for SelectedFilesResolver {
    async fn resolve(&self, _matched: &PlaceholderMatch, ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        debug!("SelectedFilesResolver::resolve: called");
        if let Some(value) = ctx.override_for(Self::NAME) {
            return Ok(Resolution::text(value));
        }
        let paths = self.files.list_selected().await;
        let joined = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Resolution::published(Self::NAME, joined))
    }
}

/// `{{selectedFileContents}}` - every selected file's text, read concurrently
///
/// Unreadable files are listed with a short note instead of failing the
/// whole placeholder.
pub struct SelectedFileContentsResolver {
    files: Arc<dyn FileEnumerator>,
}

impl SelectedFileContentsResolver {
    pub const NAME: &'static str = "selectedFileContents";

    pub fn new(files: Arc<dyn FileEnumerator>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl Resolver for SelectedFileContentsResolver {
    async fn resolve(&self, _matched: &PlaceholderMatch, ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        debug!("SelectedFileContentsResolver::resolve: called");
        if let Some(value) = ctx.override_for(Self::NAME) {
            return Ok(Resolution::text(value));
        }

        let paths = self.files.list_selected().await;
        let reads = paths.iter().map(|p| tokio::fs::read_to_string(p));
        let results = join_all(reads).await;
        debug!(count = results.len(), "SelectedFileContentsResolver::resolve: reads complete");

        let sections: Vec<String> = paths
            .iter()
            .zip(results)
            .map(|(path, result)| match result {
                Ok(contents) => format!("--- {} ---\n{}", path.display(), contents.trim_end()),
                Err(e) => format!("--- {} ---\n[unreadable: {}]", path.display(), e),
            })
            .collect();

        Ok(Resolution::published(Self::NAME, sections.join("\n\n")))
    }
}

/// `{{file:PATH}}` - contents of one file
pub struct FileResolver;

#[async_trait]
impl Resolver for FileResolver {
    async fn resolve(&self, matched: &PlaceholderMatch, _ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        let raw = matched.group(1).trim();
        debug!(%raw, "FileResolver::resolve: called");
        if raw.is_empty() {
            return Err(ResolutionFailure::InvalidArgument("file requires a path".to_string()));
        }

        let path = expand_home(raw);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ResolutionFailure::Read {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Resolution::text(contents.trim_end()))
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    Path::new(raw).to_path_buf()
}
