//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// PromptLab - resolve placeholders in prompt templates
#[derive(Parser)]
#[command(
    name = "pl",
    about = "Resolve placeholders in AI prompt templates",
    version = env!("GIT_DESCRIBE"),
    after_help = generate_after_help(),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a template and print the result
    Resolve {
        /// Template text (reads stdin when neither this nor --file is given)
        template: Option<String>,

        /// Read the template from a file
        #[arg(short, long, conflicts_with = "template")]
        file: Option<PathBuf>,

        /// Seed a context value, e.g. -s input=hello
        #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        set: Vec<(String, String)>,

        /// Select files for {{selectedFiles}} (glob patterns allowed)
        #[arg(long = "files", value_name = "GLOB")]
        files: Vec<String>,

        /// Custom placeholders file (overrides config)
        #[arg(long)]
        custom: Option<PathBuf>,

        /// Maximum scan passes (overrides config)
        #[arg(long)]
        max_passes: Option<usize>,

        /// Print the final context after the text
        #[arg(long)]
        show_context: bool,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List registered placeholders in resolution order
    Placeholders {
        /// Custom placeholders file (overrides config)
        #[arg(long)]
        custom: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check a custom placeholders file
    Validate {
        /// Path to the JSON file
        path: PathBuf,
    },
}

/// Parse a `KEY=VALUE` pair; the value may itself contain `=`
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    debug!(%s, "parse_key_value: called");
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => {
            debug!("parse_key_value: missing key or '='");
            Err(format!("expected KEY=VALUE, got '{}'", s))
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptlab")
        .join("logs")
        .join("promptlab.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with the log location
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}

/// Output format for resolve/placeholders
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_resolve_with_seeds() {
        let cli = Cli::parse_from(["pl", "resolve", "Hello {{input}}", "-s", "input=a=b", "--set", "x=1"]);
        match cli.command {
            Command::Resolve { template, set, format, .. } => {
                assert_eq!(template.as_deref(), Some("Hello {{input}}"));
                assert_eq!(
                    set,
                    vec![
                        ("input".to_string(), "a=b".to_string()),
                        ("x".to_string(), "1".to_string())
                    ]
                );
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_resolve_file_conflicts_with_template() {
        let result = Cli::try_parse_from(["pl", "resolve", "text", "-f", "prompt.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_global_options_after_subcommand() {
        let cli = Cli::parse_from(["pl", "placeholders", "-c", "/tmp/pl.yml", "-l", "debug", "--format", "json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/pl.yml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(
            cli.command,
            Command::Placeholders {
                format: OutputFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::parse_from(["pl", "validate", "custom.json"]);
        assert!(matches!(cli.command, Command::Validate { path } if path == PathBuf::from("custom.json")));
    }

    #[test]
    fn test_parse_key_value_rejects_missing_key() {
        assert!(parse_key_value("=value").is_err());
        assert!(parse_key_value("novalue").is_err());
        assert_eq!(parse_key_value("k=").unwrap(), ("k".to_string(), String::new()));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }
}
