//! Selected-file enumeration

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::FileEnumerator;

/// A fixed selection, supplied up front by the caller
#[derive(Debug, Clone, Default)]
pub struct StaticFileEnumerator {
    paths: Vec<PathBuf>,
}

impl StaticFileEnumerator {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        debug!(count = paths.len(), "StaticFileEnumerator::new: called");
        Self { paths }
    }

    /// Expand glob patterns into a selection
    ///
    /// Patterns are expanded in order and each pattern's matches are sorted.
    /// A pattern that matches nothing is kept as a literal path; an invalid
    /// pattern is logged and skipped. Duplicates keep their first position.
    pub fn from_globs<S: AsRef<str>>(patterns: &[S]) -> Self {
        debug!(count = patterns.len(), "StaticFileEnumerator::from_globs: called");
        let mut paths: Vec<PathBuf> = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            match glob::glob(pattern) {
                Ok(entries) => {
                    let mut matched: Vec<PathBuf> = entries.filter_map(|e| e.ok()).collect();
                    matched.sort();
                    if matched.is_empty() {
                        debug!(%pattern, "StaticFileEnumerator::from_globs: no matches, keeping literal");
                        matched.push(PathBuf::from(pattern));
                    }
                    for path in matched {
                        if !paths.contains(&path) {
                            paths.push(path);
                        }
                    }
                }
                Err(e) => {
                    warn!(%pattern, error = %e, "Skipping invalid file pattern");
                }
            }
        }

        Self { paths }
    }
}

#[async_trait]
impl FileEnumerator for StaticFileEnumerator {
    async fn list_selected(&self) -> Vec<PathBuf> {
        debug!(count = self.paths.len(), "StaticFileEnumerator::list_selected: called");
        self.paths.clone()
    }
}
