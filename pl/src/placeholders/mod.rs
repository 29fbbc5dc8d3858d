//! Placeholder definitions and the registry the engine consults
//!
//! Every placeholder, built-in or user-authored, is a [`PlaceholderDefinition`]:
//! a regex pattern, an [`Effect`] tag, and a [`Resolver`]. The
//! [`PlaceholderRegistry`] keeps them in a fixed order for a session.

pub mod builtin;
mod custom;
mod definition;
mod error;
mod registry;

pub use custom::{CustomPlaceholder, CustomPlaceholderLoader, LoadReport, expand_template};
pub use definition::{Effect, Origin, PlaceholderDefinition, PlaceholderMatch, Resolution, Resolver};
pub use error::ResolutionFailure;
pub use registry::PlaceholderRegistry;
