//! Value placeholders: context lookups, session clock, user environment

use async_trait::async_trait;
use tracing::debug;

use crate::engine::ResolutionContext;
use crate::placeholders::{PlaceholderMatch, Resolution, ResolutionFailure, Resolver};

/// Returns the context value stored under its own name, or `""`
///
/// Backs `{{input}}`, `{{clipboardText}}`, `{{previousResponse}}` and the
/// other values the caller gathers before resolution.
pub struct ContextValueResolver {
    name: &'static str,
}

impl ContextValueResolver {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl Resolver for ContextValueResolver {
    async fn resolve(&self, _matched: &PlaceholderMatch, ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        debug!(name = self.name, "ContextValueResolver::resolve: called");
        let value = ctx.get(self.name).unwrap_or_default();
        Ok(Resolution::published(self.name, value))
    }
}

/// Formats the session clock
pub struct ClockResolver {
    name: &'static str,
    format: &'static str,
}

impl ClockResolver {
    pub fn new(name: &'static str, format: &'static str) -> Self {
        Self { name, format }
    }
}

#[async_trait]
impl Resolver for ClockResolver {
    async fn resolve(&self, _matched: &PlaceholderMatch, ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        debug!(name = self.name, "ClockResolver::resolve: called");
        if let Some(value) = ctx.override_for(self.name) {
            debug!("ClockResolver::resolve: using context override");
            return Ok(Resolution::text(value));
        }
        let value = ctx.now().format(self.format).to_string();
        Ok(Resolution::published(self.name, value))
    }
}

/// What an [`EnvironmentResolver`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentValue {
    User,
    HomeDir,
}

/// Reports facts about the user's environment
pub struct EnvironmentResolver {
    name: &'static str,
    value: EnvironmentValue,
}

impl EnvironmentResolver {
    pub fn new(name: &'static str, value: EnvironmentValue) -> Self {
        Self { name, value }
    }

    fn compute(&self) -> String {
        match self.value {
            EnvironmentValue::User => std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_default(),
            EnvironmentValue::HomeDir => dirs::home_dir()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Resolver for EnvironmentResolver {
    async fn resolve(&self, _matched: &PlaceholderMatch, ctx: &ResolutionContext) -> Result<Resolution, ResolutionFailure> {
        debug!(name = self.name, value = ?self.value, "EnvironmentResolver::resolve: called");
        if let Some(value) = ctx.override_for(self.name) {
            return Ok(Resolution::text(value));
        }
        Ok(Resolution::published(self.name, self.compute()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn token(text: &str) -> PlaceholderMatch {
        PlaceholderMatch {
            text: text.to_string(),
            start: 0,
            groups: vec![Some(text.to_string())],
        }
    }

    #[tokio::test]
    async fn test_context_value_present() {
        let ctx = ResolutionContext::seeded([("input", "world")]);
        let r = ContextValueResolver::new("input")
            .resolve(&token("{{input}}"), &ctx)
            .await
            .unwrap();
        assert_eq!(r.text, "world");
        assert_eq!(r.updates, vec![("input".to_string(), "world".to_string())]);
    }

    #[tokio::test]
    async fn test_context_value_absent_is_empty() {
        let r = ContextValueResolver::new("clipboardText")
            .resolve(&token("{{clipboardText}}"), &ResolutionContext::new())
            .await
            .unwrap();
        assert_eq!(r.text, "");
    }

    #[tokio::test]
    async fn test_clock_uses_session_time() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let ctx = ResolutionContext::at(now);

        let date = ClockResolver::new("date", "%B %-d, %Y");
        let r = date.resolve(&token("{{date}}"), &ctx).await.unwrap();
        assert_eq!(r.text, "March 9, 2024");

        let time = ClockResolver::new("time", "%-I:%M %p");
        let r = time.resolve(&token("{{time}}"), &ctx).await.unwrap();
        assert_eq!(r.text, "2:05 PM");

        let day = ClockResolver::new("day", "%A");
        let r = day.resolve(&token("{{day}}"), &ctx).await.unwrap();
        assert_eq!(r.text, "Saturday");
    }

    #[tokio::test]
    async fn test_clock_override() {
        let mut ctx = ResolutionContext::new();
        ctx.set("date", "yesterday");
        let r = ClockResolver::new("date", "%B %-d, %Y")
            .resolve(&token("{{date}}"), &ctx)
            .await
            .unwrap();
        assert_eq!(r.text, "yesterday");
        assert!(r.updates.is_empty());
    }

    #[tokio::test]
    async fn test_environment_override() {
        let ctx = ResolutionContext::seeded([("user", "alice")]);
        let r = EnvironmentResolver::new("user", EnvironmentValue::User)
            .resolve(&token("{{user}}"), &ctx)
            .await
            .unwrap();
        assert_eq!(r.text, "alice");
    }

    #[tokio::test]
    async fn test_homedir_matches_dirs() {
        let r = EnvironmentResolver::new("homedir", EnvironmentValue::HomeDir)
            .resolve(&token("{{homedir}}"), &ResolutionContext::new())
            .await
            .unwrap();
        let expected = dirs::home_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert_eq!(r.text, expected);
    }
}
