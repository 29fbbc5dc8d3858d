//! ResolutionEngine - the scan/dispatch/splice loop

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::{CancelSignal, ResolutionContext, ResolutionWarning};
use crate::config::{Config, DEFAULT_MAX_PASSES};
use crate::placeholders::{
    Effect, PlaceholderDefinition, PlaceholderMatch, PlaceholderRegistry, Resolution, ResolutionFailure,
};

/// Engine limits, threaded in from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum full scans of the text; at least 1
    pub max_passes: usize,
    pub warn_on_recursion_limit: bool,
}

impl EngineOptions {
    pub fn new(max_passes: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
            warn_on_recursion_limit: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        debug!(max_passes = config.engine.max_passes, "EngineOptions::from_config: called");
        Self {
            warn_on_recursion_limit: config.engine.warn_on_recursion_limit,
            ..Self::new(config.engine.max_passes)
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PASSES)
    }
}

/// How a resolution session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStatus {
    /// Reached a fixed point or the pass cap
    Completed,
    /// The caller cancelled; `text` holds whatever was spliced before that
    Cancelled,
}

/// Result of resolving one template
#[derive(Debug, Clone, Serialize)]
pub struct ResolveOutcome {
    pub session_id: Uuid,
    pub text: String,
    pub context: BTreeMap<String, String>,
    pub warnings: Vec<ResolutionWarning>,
    /// Number of scans performed
    pub passes: usize,
    pub status: ResolveStatus,
}

impl ResolveOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.status == ResolveStatus::Cancelled
    }
}

/// Outcome of handing one match to its resolver
enum Dispatch {
    Done(Result<Resolution, ResolutionFailure>),
    Cancelled,
}

/// Byte ranges of the working text that were spliced in from resolver output
///
/// Seeded values, fetched pages and script output all arrive this way. Kept
/// sorted and non-overlapping, and shifted on every splice so the offsets
/// stay valid for the current text.
#[derive(Debug, Default)]
struct SplicedRanges(Vec<Range<usize>>);

impl SplicedRanges {
    /// Whether every spliced byte of `span` lies inside one of `groups`
    fn confined_to(&self, span: Range<usize>, groups: &[Range<usize>]) -> bool {
        self.0
            .iter()
            .filter(|r| r.start < span.end && span.start < r.end)
            .all(|r| {
                let (lo, hi) = (r.start.max(span.start), r.end.min(span.end));
                groups.iter().any(|g| g.start <= lo && hi <= g.end)
            })
    }

    /// Account for `replaced` being swapped for `len` bytes of resolver output
    fn splice(&mut self, replaced: Range<usize>, len: usize) {
        let Range { start, end } = replaced;
        let shift = |pos: usize| pos - end + start + len;
        let mut ranges = Vec::with_capacity(self.0.len() + 1);
        for range in self.0.drain(..) {
            if range.start < start {
                ranges.push(range.start..range.end.min(start));
            }
            if range.end > end {
                ranges.push(shift(range.start.max(end))..shift(range.end));
            }
        }
        if len > 0 {
            ranges.push(start..start + len);
        }
        ranges.sort_by_key(|r| r.start);

        self.0.clear();
        for range in ranges {
            match self.0.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => self.0.push(range),
            }
        }
    }
}

/// Drives placeholder resolution over a template
///
/// Within a pass the text is scanned left to right: the leftmost match wins,
/// ties at the same offset go to the earlier-registered definition, and the
/// scan resumes right after the replacement text. A new pass restarts from
/// the top so that placeholders produced by earlier replacements (or left
/// behind by nested tokens) get their turn. Resolution stops at a fixed
/// point or after `max_passes` scans.
///
/// Effectful directives only run when they start in template-authored text.
/// A `{{shell:...}}` that arrives inside a seeded value, a fetched page or
/// another resolver's output stays in the result verbatim; Pure placeholders
/// in that text still expand.
///
/// Matches are dispatched one at a time; resolvers never run concurrently
/// with each other within a session.
pub struct ResolutionEngine {
    registry: Arc<PlaceholderRegistry>,
    options: EngineOptions,
}

impl ResolutionEngine {
    pub fn new(registry: Arc<PlaceholderRegistry>, options: EngineOptions) -> Self {
        debug!(definitions = registry.len(), ?options, "ResolutionEngine::new: called");
        Self { registry, options }
    }

    pub fn registry(&self) -> &PlaceholderRegistry {
        &self.registry
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Resolve a template with caller-supplied seed values
    pub async fn resolve<I, K, V>(&self, template: &str, seed: I) -> ResolveOutcome
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.resolve_in(template, ResolutionContext::seeded(seed), None).await
    }

    /// Resolve a template, stopping early if `cancel` fires
    pub async fn resolve_with_cancel<I, K, V>(&self, template: &str, seed: I, cancel: CancelSignal) -> ResolveOutcome
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.resolve_in(template, ResolutionContext::seeded(seed), Some(cancel)).await
    }

    /// Resolve a template against a prepared context
    pub async fn resolve_in(
        &self,
        template: &str,
        mut ctx: ResolutionContext,
        mut cancel: Option<CancelSignal>,
    ) -> ResolveOutcome {
        let session_id = Uuid::now_v7();
        info!(%session_id, template_len = template.len(), seeded = ctx.len(), "Resolving template");

        let mut text = template.to_string();
        let mut warnings = Vec::new();
        let mut cache: HashMap<(usize, String), Resolution> = HashMap::new();
        let mut spliced = SplicedRanges::default();
        let mut status = ResolveStatus::Completed;
        let mut passes = 0;

        'passes: while passes < self.options.max_passes {
            passes += 1;
            let mut cursor = 0;
            let mut dispatched = 0;
            debug!(%session_id, pass = passes, "ResolutionEngine::resolve_in: starting pass");

            while let Some((index, start)) = self.next_match(&text, cursor, &spliced) {
                if cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                    debug!(%session_id, "ResolutionEngine::resolve_in: cancelled between dispatches");
                    status = ResolveStatus::Cancelled;
                    break 'passes;
                }

                let def = Arc::clone(&self.registry.definitions()[index]);
                let Some(matched) = def.match_at(&text, start) else {
                    debug!(name = %def.name, "ResolutionEngine::resolve_in: match vanished, skipping");
                    cursor = start + text[start..].chars().next().map_or(1, char::len_utf8);
                    continue;
                };
                let end = start + matched.text.len();
                debug!(name = %def.name, start, end, "ResolutionEngine::resolve_in: dispatching");

                let cache_key = def.constant.then(|| (index, matched.text.clone()));
                let cached = cache_key.as_ref().and_then(|k| cache.get(k)).cloned();

                let outcome = match cached {
                    Some(resolution) => {
                        debug!(name = %def.name, "ResolutionEngine::resolve_in: cache hit");
                        Dispatch::Done(Ok(resolution))
                    }
                    None => Self::dispatch(Arc::clone(&def), matched, &ctx, cancel.as_mut()).await,
                };

                let replacement = match outcome {
                    Dispatch::Cancelled => {
                        debug!(%session_id, name = %def.name, "ResolutionEngine::resolve_in: result discarded after cancel");
                        status = ResolveStatus::Cancelled;
                        break 'passes;
                    }
                    Dispatch::Done(Ok(resolution)) => {
                        if let Some(key) = cache_key {
                            cache.entry(key).or_insert_with(|| resolution.clone());
                        }
                        ctx.merge(resolution.updates);
                        resolution.text
                    }
                    Dispatch::Done(Err(failure)) => {
                        let warning = ResolutionWarning::DirectiveExecutionFailure {
                            placeholder: def.name.clone(),
                            effect: def.effect,
                            message: failure.to_string(),
                        };
                        warn!(%session_id, "{}", warning);
                        warnings.push(warning);
                        String::new()
                    }
                };

                text.replace_range(start..end, &replacement);
                spliced.splice(start..end, replacement.len());
                cursor = start + replacement.len();
                dispatched += 1;
            }

            if dispatched == 0 {
                debug!(%session_id, pass = passes, "ResolutionEngine::resolve_in: fixed point reached");
                break;
            }
        }

        if status == ResolveStatus::Completed
            && self.options.warn_on_recursion_limit
            && passes >= self.options.max_passes
            && self.next_match(&text, 0, &spliced).is_some()
        {
            let warning = ResolutionWarning::RecursionLimitExceeded { passes };
            warn!(%session_id, "{}", warning);
            warnings.push(warning);
        }

        info!(
            %session_id,
            passes,
            warnings = warnings.len(),
            ?status,
            "Resolution finished"
        );

        ResolveOutcome {
            session_id,
            text,
            context: ctx.into_values(),
            warnings,
            passes,
            status,
        }
    }

    /// Leftmost match at or after `cursor`; earlier registration wins ties
    ///
    /// An Effectful match is only taken when its delimiters and directive
    /// name are template text; spliced text may appear inside its arguments.
    fn next_match(&self, text: &str, cursor: usize, spliced: &SplicedRanges) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (index, def) in self.registry.iter().enumerate() {
            if let Some(start) = Self::find_from(def, text, cursor, spliced)
                && best.is_none_or(|(_, best_start)| start < best_start)
            {
                best = Some((index, start));
            }
        }
        best
    }

    fn find_from(def: &PlaceholderDefinition, text: &str, cursor: usize, spliced: &SplicedRanges) -> Option<usize> {
        let mut from = cursor;
        loop {
            let (start, end) = def.find_at(text, from)?;
            if def.effect == Effect::Pure || Self::template_authored(def, text, start..end, spliced) {
                return Some(start);
            }
            trace!(name = %def.name, start, "ResolutionEngine::find_from: skipping directive from spliced text");
            from = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
    }

    fn template_authored(def: &PlaceholderDefinition, text: &str, span: Range<usize>, spliced: &SplicedRanges) -> bool {
        let groups: Vec<Range<usize>> = def
            .pattern
            .captures_at(text, span.start)
            .map(|caps| caps.iter().skip(1).flatten().map(|g| g.range()).collect())
            .unwrap_or_default();
        spliced.confined_to(span, &groups)
    }

    /// Run one resolver on its own task
    ///
    /// If cancellation is observed while the resolver is running, the task
    /// is left to finish on its own and its result is dropped.
    async fn dispatch(
        def: Arc<PlaceholderDefinition>,
        matched: PlaceholderMatch,
        ctx: &ResolutionContext,
        cancel: Option<&mut CancelSignal>,
    ) -> Dispatch {
        let snapshot = ctx.clone();
        let task = tokio::spawn(async move { def.resolver.resolve(&matched, &snapshot).await });

        let joined = match cancel {
            Some(signal) => {
                tokio::select! {
                    biased;
                    _ = signal.cancelled() => return Dispatch::Cancelled,
                    joined = task => joined,
                }
            }
            None => task.await,
        };

        match joined {
            Ok(result) => Dispatch::Done(result),
            Err(e) => Dispatch::Done(Err(ResolutionFailure::Aborted(e.to_string()))),
        }
    }
}

/// Resolve `template` against `registry` with default engine options
pub async fn resolve<I, K, V>(template: &str, seed: I, registry: Arc<PlaceholderRegistry>) -> ResolveOutcome
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    ResolutionEngine::new(registry, EngineOptions::default())
        .resolve(template, seed)
        .await
}
