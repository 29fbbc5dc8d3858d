//! PromptLab - placeholder resolution for AI prompt templates
//!
//! A prompt template is plain text with embedded `{{...}}` tokens. PromptLab
//! turns it into a fully resolved prompt by matching tokens against an
//! ordered registry of placeholders, running each one's resolver, and
//! splicing the result back in until nothing changes.
//!
//! # Modules
//!
//! - [`placeholders`] - definitions, built-ins, custom loader, registry
//! - [`engine`] - resolution loop, context, warnings, cancellation
//! - [`capabilities`] - script, fetch, file and launch adapters
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use promptlab::{Capabilities, PlaceholderRegistry, resolve};
//!
//! # async fn demo() {
//! let registry = Arc::new(PlaceholderRegistry::builtin(&Capabilities::inert()));
//! let outcome = resolve("Hello {{input}}", [("input", "world")], registry).await;
//! assert_eq!(outcome.text, "Hello world");
//! # }
//! ```

pub mod capabilities;
pub mod cli;
pub mod config;
pub mod engine;
pub mod placeholders;

pub use capabilities::Capabilities;
pub use config::Config;
pub use engine::{
    CancelHandle, CancelSignal, EngineOptions, ResolutionContext, ResolutionEngine, ResolutionWarning, ResolveOutcome,
    ResolveStatus, cancel_pair, resolve,
};
pub use placeholders::{CustomPlaceholderLoader, Effect, PlaceholderDefinition, PlaceholderRegistry};
