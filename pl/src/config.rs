//! PromptLab configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Local config file name, checked in the current directory
pub const LOCAL_CONFIG_FILE: &str = ".promptlab.yml";

/// Main PromptLab configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Resolution engine limits
    pub engine: EngineConfig,

    /// Script execution for `{{shell:...}}`, `{{as:...}}` and `{{js:...}}`
    pub scripts: ScriptsConfig,

    /// URL fetching for `{{url:...}}`
    pub fetch: FetchConfig,

    /// Custom placeholder configuration
    pub placeholders: PlaceholdersConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// 1. Explicit path (errors are fatal)
    /// 2. `./.promptlab.yml`
    /// 3. `~/.config/promptlab/promptlab.yml`
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        debug!(?config_path, "Config::load: called");
        if let Some(path) = config_path {
            debug!("Config::load: explicit config path provided");
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                debug!(?candidate, "Config::load: candidate exists");
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Never fails: a broken config file is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let paths: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::candidate_paths(),
        };

        paths
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("promptlab").join("promptlab.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Resolution engine limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of scan passes over a template
    #[serde(rename = "max-passes")]
    pub max_passes: usize,

    /// Report text that still matches a placeholder after the last pass
    #[serde(rename = "warn-on-recursion-limit")]
    pub warn_on_recursion_limit: bool,
}

/// Default pass cap: one pass for the template plus four re-expansions
pub const DEFAULT_MAX_PASSES: usize = 5;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            warn_on_recursion_limit: true,
        }
    }
}

/// Script execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Shell used for `{{shell:...}}`
    pub shell: String,

    /// Per-script timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Script output is truncated past this many characters
    #[serde(rename = "max-output-chars")]
    pub max_output_chars: usize,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            timeout_ms: 30_000,
            max_output_chars: 30_000,
        }
    }
}

/// URL fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Responses larger than this are rejected
    #[serde(rename = "max-bytes")]
    pub max_bytes: usize,

    /// Extracted text is truncated past this many characters
    #[serde(rename = "max-chars")]
    pub max_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: format!("PromptLab/{} (url placeholder)", env!("CARGO_PKG_VERSION")),
            max_bytes: 1_000_000,
            max_chars: 50_000,
        }
    }
}

/// Custom placeholder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholdersConfig {
    /// JSON file holding user-defined placeholders
    #[serde(rename = "custom-path")]
    pub custom_path: PathBuf,
}

impl Default for PlaceholdersConfig {
    fn default() -> Self {
        let custom_path = dirs::config_dir()
            .map(|d| d.join("promptlab"))
            .unwrap_or_else(|| PathBuf::from(".promptlab"))
            .join("custom_placeholders.json");

        Self { custom_path }
    }
}
