//! PlaceholderRegistry - the ordered set of definitions for a session

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::builtin;
use super::custom::{CustomPlaceholderLoader, LoadReport};
use super::{Origin, PlaceholderDefinition};
use crate::capabilities::Capabilities;
use crate::config::Config;
use crate::engine::ResolutionWarning;

/// Ordered, name-deduplicated placeholder definitions
///
/// Order decides ties: when two definitions match at the same offset, the
/// one registered first wins. Built-ins are always registered before custom
/// placeholders. The registry is read-only once a session starts.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderRegistry {
    definitions: Vec<Arc<PlaceholderDefinition>>,
}

impl PlaceholderRegistry {
    /// An empty registry
    pub fn new() -> Self {
        debug!("PlaceholderRegistry::new: called");
        Self::default()
    }

    /// A registry holding only the built-ins
    pub fn builtin(caps: &Capabilities) -> Self {
        debug!("PlaceholderRegistry::builtin: called");
        let mut registry = Self::new();
        for def in builtin::definitions(caps) {
            if let Err(warning) = registry.push(def) {
                warn!("Built-in placeholder rejected: {}", warning);
            }
        }
        registry
    }

    /// Built-ins plus the custom placeholders named by the configuration
    pub fn for_session(config: &Config, caps: &Capabilities) -> (Self, Vec<ResolutionWarning>) {
        debug!(custom_path = ?config.placeholders.custom_path, "PlaceholderRegistry::for_session: called");
        let mut registry = Self::builtin(caps);
        let report = CustomPlaceholderLoader::load_file(&config.placeholders.custom_path);
        let warnings = registry.extend_custom(report);
        info!(
            "Registry ready: {} placeholders ({} custom)",
            registry.len(),
            registry.iter().filter(|d| d.origin == Origin::Custom).count()
        );
        (registry, warnings)
    }

    /// Register a definition after all existing ones
    ///
    /// A definition whose name is already taken is rejected.
    pub fn push(&mut self, def: PlaceholderDefinition) -> Result<(), ResolutionWarning> {
        debug!(name = %def.name, "PlaceholderRegistry::push: called");
        if self.get(&def.name).is_some() {
            debug!("PlaceholderRegistry::push: duplicate name");
            return Err(ResolutionWarning::DuplicatePlaceholder { name: def.name });
        }
        self.definitions.push(Arc::new(def));
        Ok(())
    }

    /// Register loaded custom placeholders, returning every warning from the load
    pub fn extend_custom(&mut self, report: LoadReport) -> Vec<ResolutionWarning> {
        debug!(count = report.placeholders.len(), "PlaceholderRegistry::extend_custom: called");
        let mut warnings = report.warnings;
        for def in report.placeholders {
            if let Err(warning) = self.push(def) {
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
        warnings
    }

    pub fn get(&self, name: &str) -> Option<&Arc<PlaceholderDefinition>> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PlaceholderDefinition>> {
        self.definitions.iter()
    }

    pub fn definitions(&self) -> &[Arc<PlaceholderDefinition>] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
