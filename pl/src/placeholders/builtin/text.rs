//! Text helpers: case transforms, context variables, comments

use async_trait::async_trait;
use tracing::debug;

use crate::engine::ResolutionContext;
use crate::placeholders::{PlaceholderMatch, Resolution, ResolutionFailure, Resolver};

/// Transformation applied by a [`TransformResolver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Uppercase,
    Lowercase,
    Trim,
}

impl Transform {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
            Self::Trim => text.trim().to_string(),
        }
    }
}

/// `{{uppercase:...}}`, `{{lowercase:...}}`, `{{trim:...}}`
pub struct TransformResolver {
    transform: Transform,
}

impl TransformResolver {
    pub fn new(transform: Transform) -> Self {
        Self { transform }
    }
}

#[async_trait]
impl Resolver for TransformResolver {
    async fn resolve(&self, matched: &PlaceholderMatch, _ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        debug!(transform = ?self.transform, "TransformResolver::resolve: called");
        Ok(Resolution::text(self.transform.apply(matched.group(1))))
    }
}

/// `{{get:NAME}}` - read a context value
pub struct GetResolver;

#[async_trait]
impl Resolver for GetResolver {
    async fn resolve(&self, matched: &PlaceholderMatch, ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        let name = matched.group(1);
        debug!(%name, "GetResolver::resolve: called");
        Ok(Resolution::text(ctx.get(name).unwrap_or_default()))
    }
}

/// `{{set:NAME:VALUE}}` - write a context value, yield nothing
pub struct SetResolver;

#[async_trait]
impl Resolver for SetResolver {
    async fn resolve(&self, matched: &PlaceholderMatch, _ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        let name = matched.group(1);
        debug!(%name, "SetResolver::resolve: called");
        if name.is_empty() {
            return Err(ResolutionFailure::InvalidArgument("set requires a variable name".to_string()));
        }
        Ok(Resolution::text("").with_update(name, matched.group(2)))
    }
}

/// `{{ignore:...}}` and `{{#...}}` - discard the argument
///
/// Tokens nested in the argument are resolved in an earlier pass, so their
/// side effects still happen.
pub struct IgnoreResolver;

#[async_trait]
impl Resolver for IgnoreResolver {
    async fn resolve(&self, matched: &PlaceholderMatch, _ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        debug!(len = matched.text.len(), "IgnoreResolver::resolve: called");
        Ok(Resolution::text(""))
    }
}
