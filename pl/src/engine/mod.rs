//! Resolution engine
//!
//! Scans a template for placeholder matches, dispatches each to its
//! resolver, splices the replacement in, and repeats until nothing changes.

mod cancel;
mod context;
mod driver;
mod warning;

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use context::ResolutionContext;
pub use driver::{EngineOptions, ResolutionEngine, ResolveOutcome, ResolveStatus, resolve};
pub use warning::ResolutionWarning;
