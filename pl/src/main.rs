//! PromptLab - prompt template resolver
//!
//! CLI entry point for resolving templates and inspecting placeholders.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use serde::Serialize;
use tracing::{debug, info};

use promptlab::capabilities::{Capabilities, LaunchRequest, RecordingLauncher, StaticFileEnumerator};
use promptlab::cli::{Cli, Command, OutputFormat, get_log_path};
use promptlab::config::Config;
use promptlab::engine::{EngineOptions, ResolutionEngine, ResolutionWarning, ResolveOutcome, cancel_pair};
use promptlab::placeholders::{CustomPlaceholderLoader, Effect, Origin, PlaceholderRegistry};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Resolve {
            template,
            file,
            set,
            files,
            custom,
            max_passes,
            show_context,
            format,
        } => {
            debug!(?file, seeds = set.len(), ?max_passes, ?format, "main: matched Resolve command");
            let template = read_template(template, file)?;
            let args = ResolveArgs {
                seed: set,
                files,
                custom,
                max_passes,
                show_context,
                format,
            };
            cmd_resolve(config, &template, args).await
        }
        Command::Placeholders { custom, format } => {
            debug!(?custom, ?format, "main: matched Placeholders command");
            cmd_placeholders(config, custom, format)
        }
        Command::Validate { path } => {
            debug!(?path, "main: matched Validate command");
            cmd_validate(&path)
        }
    }
}

struct ResolveArgs {
    seed: Vec<(String, String)>,
    files: Vec<String>,
    custom: Option<PathBuf>,
    max_passes: Option<usize>,
    show_context: bool,
    format: OutputFormat,
}

/// JSON shape of `pl resolve --format json`
#[derive(Serialize)]
struct ResolveReport<'a> {
    #[serde(flatten)]
    outcome: &'a ResolveOutcome,
    launches: Vec<LaunchRequest>,
}

/// Template from the argument, a file, or stdin
fn read_template(template: Option<String>, file: Option<PathBuf>) -> Result<String> {
    debug!(has_template = template.is_some(), ?file, "read_template: called");
    if let Some(template) = template {
        return Ok(template);
    }
    if let Some(path) = file {
        return fs::read_to_string(&path).context(format!("Failed to read template {}", path.display()));
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read template from stdin")?;
    Ok(buffer)
}

/// Resolve one template
async fn cmd_resolve(mut config: Config, template: &str, args: ResolveArgs) -> Result<()> {
    debug!(template_len = template.len(), "cmd_resolve: called");
    if let Some(custom) = args.custom {
        config.placeholders.custom_path = custom;
    }
    if let Some(max_passes) = args.max_passes {
        config.engine.max_passes = max_passes;
    }

    let launcher = Arc::new(RecordingLauncher::new());
    let caps = Capabilities::from_config(&config)
        .with_files(Arc::new(StaticFileEnumerator::from_globs(&args.files)))
        .with_launcher(launcher.clone());

    let (registry, load_warnings) = PlaceholderRegistry::for_session(&config, &caps);
    let engine = ResolutionEngine::new(Arc::new(registry), EngineOptions::from_config(&config));

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling resolution");
            handle.cancel();
        }
    });

    let mut outcome = engine.resolve_with_cancel(template, args.seed, signal).await;
    let mut warnings = load_warnings;
    warnings.append(&mut outcome.warnings);
    outcome.warnings = warnings;
    let launches = launcher.requests();

    match args.format {
        OutputFormat::Json => {
            let report = ResolveReport {
                outcome: &outcome,
                launches,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            print!("{}", outcome.text);
            if !outcome.text.ends_with('\n') {
                println!();
            }
            if args.show_context {
                eprintln!("{}", "context:".bold());
                for (key, value) in &outcome.context {
                    eprintln!("  {} = {}", key.cyan(), value);
                }
            }
            for request in &launches {
                eprintln!("{} {} ({} bytes of input)", "launch:".blue().bold(), request.command, request.input.len());
            }
            print_warnings(&outcome.warnings);
        }
    }

    if outcome.is_cancelled() {
        return Err(eyre!("Resolution cancelled after {} passes", outcome.passes));
    }
    Ok(())
}

/// List the registry in resolution order
fn cmd_placeholders(mut config: Config, custom: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    debug!(?custom, "cmd_placeholders: called");
    if let Some(custom) = custom {
        config.placeholders.custom_path = custom;
    }

    let (registry, warnings) = PlaceholderRegistry::for_session(&config, &Capabilities::inert());

    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Entry<'a> {
                name: &'a str,
                pattern: &'a str,
                effect: Effect,
                origin: Origin,
                constant: bool,
                description: &'a str,
                example: &'a str,
            }

            let entries: Vec<Entry<'_>> = registry
                .iter()
                .map(|d| Entry {
                    name: &d.name,
                    pattern: d.pattern.as_str(),
                    effect: d.effect,
                    origin: d.origin,
                    constant: d.constant,
                    description: &d.description,
                    example: &d.example,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            for (index, def) in registry.iter().enumerate() {
                let name = match def.origin {
                    Origin::Builtin => def.name.normal(),
                    Origin::Custom => def.name.green(),
                };
                let effect = match def.effect {
                    Effect::Pure => "pure".dimmed(),
                    Effect::Effectful => "effectful".yellow(),
                };
                println!("{:>3}. {:<22} {:<10} {}", index + 1, name, effect, def.description);
                if !def.example.is_empty() {
                    println!("     {:<22} {}", "", def.example.dimmed());
                }
            }
        }
    }

    print_warnings(&warnings);
    Ok(())
}

/// Check a custom placeholders file against the built-ins
fn cmd_validate(path: &Path) -> Result<()> {
    debug!(?path, "cmd_validate: called");
    if !path.exists() {
        return Err(eyre!("File not found: {}", path.display()));
    }

    let report = CustomPlaceholderLoader::load_file(path);
    let mut registry = PlaceholderRegistry::builtin(&Capabilities::inert());
    let entries: Vec<(String, String)> = report
        .placeholders
        .iter()
        .map(|d| (d.name.clone(), d.pattern.as_str().to_string()))
        .collect();
    let warnings = registry.extend_custom(report);

    // An entry counts as registered only if the custom definition under its name is this one
    for (name, pattern) in &entries {
        if let Some(def) = registry.get(name)
            && def.origin == Origin::Custom
            && def.pattern.as_str() == pattern
        {
            println!("{} {:<22} {}", "\u{2705}".green(), name, pattern);
        }
    }
    print_warnings(&warnings);

    if warnings.is_empty() {
        println!("{} is valid", path.display());
        Ok(())
    } else {
        Err(eyre!("{} problem(s) found in {}", warnings.len(), path.display()))
    }
}

fn print_warnings(warnings: &[ResolutionWarning]) {
    for warning in warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}
