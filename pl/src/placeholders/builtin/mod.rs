//! Built-in placeholders
//!
//! Built-ins are registered in the order listed here, before any custom
//! placeholder. Value placeholders come first, then text helpers, then
//! directives.

mod directives;
mod files;
mod text;
mod values;

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

pub use directives::{LaunchResolver, ScriptResolver, UrlResolver};
pub use files::{FileResolver, SelectedFileContentsResolver, SelectedFilesResolver};
pub use text::{GetResolver, IgnoreResolver, SetResolver, Transform, TransformResolver};
pub use values::{ClockResolver, ContextValueResolver, EnvironmentResolver, EnvironmentValue};

use super::{Effect, Origin, PlaceholderDefinition, Resolver};
use crate::capabilities::{Capabilities, ScriptKind};

/// Directive argument: any text without `{{` or `}}`
///
/// Single-level braces such as `${HOME}` or `awk '{print $1}'` are allowed.
/// A nested `{{token}}` prevents the match until an earlier pass has
/// resolved the inner token.
pub const ARG: &str = r"((?:[^{}]|\{[^{}]*\})*)";

/// Caller-supplied values exposed as `{{name}}`
pub const CONTEXT_VALUES: &[(&str, &str)] = &[
    ("input", "The input text supplied when the command was run"),
    ("clipboardText", "The current clipboard text"),
    ("selectedText", "The currently selected text"),
    ("currentApplication", "Name of the frontmost application"),
    ("currentURL", "URL of the active browser tab"),
    ("previousCommand", "Name of the last command that ran"),
    ("previousResponse", "The response of the last command that ran"),
    ("previousPrompt", "The fully resolved prompt of the last command that ran"),
];

fn builtin(
    name: &str,
    pattern: &str,
    effect: Effect,
    constant: bool,
    description: &str,
    example: &str,
    resolver: Arc<dyn Resolver>,
) -> PlaceholderDefinition {
    PlaceholderDefinition {
        name: name.to_string(),
        pattern: Regex::new(pattern).expect("built-in placeholder pattern is valid"),
        effect,
        constant,
        description: description.to_string(),
        example: example.to_string(),
        origin: Origin::Builtin,
        resolver,
    }
}

/// Exact `{{name}}` token
fn exact(name: &str) -> String {
    format!(r"\{{\{{{}\}}\}}", regex::escape(name))
}

/// `{{prefix:ARG}}` token
fn with_arg(prefix: &str) -> String {
    format!(r"\{{\{{{}:{}\}}\}}", regex::escape(prefix), ARG)
}

/// All built-in definitions, in registration order
pub fn definitions(caps: &Capabilities) -> Vec<PlaceholderDefinition> {
    debug!("builtin::definitions: called");
    let mut defs = Vec::new();

    for &(name, description) in CONTEXT_VALUES {
        defs.push(builtin(
            name,
            &exact(name),
            Effect::Pure,
            false,
            description,
            &format!("{{{{{}}}}}", name),
            Arc::new(ContextValueResolver::new(name)),
        ));
    }

    for (name, format, description) in [
        ("date", "%B %-d, %Y", "The current date"),
        ("time", "%-I:%M %p", "The current time"),
        ("day", "%A", "The current day of the week"),
    ] {
        defs.push(builtin(
            name,
            &exact(name),
            Effect::Pure,
            false,
            description,
            &format!("{{{{{}}}}}", name),
            Arc::new(ClockResolver::new(name, format)),
        ));
    }

    defs.push(builtin(
        "user",
        &exact("user"),
        Effect::Pure,
        false,
        "The current user's login name",
        "{{user}}",
        Arc::new(EnvironmentResolver::new("user", EnvironmentValue::User)),
    ));
    defs.push(builtin(
        "homedir",
        &exact("homedir"),
        Effect::Pure,
        false,
        "The current user's home directory",
        "{{homedir}}",
        Arc::new(EnvironmentResolver::new("homedir", EnvironmentValue::HomeDir)),
    ));

    defs.push(builtin(
        SelectedFilesResolver::NAME,
        &exact(SelectedFilesResolver::NAME),
        Effect::Pure,
        false,
        "Paths of the selected files, comma separated",
        "{{selectedFiles}}",
        Arc::new(SelectedFilesResolver::new(caps.files.clone())),
    ));
    defs.push(builtin(
        SelectedFileContentsResolver::NAME,
        &exact(SelectedFileContentsResolver::NAME),
        Effect::Pure,
        false,
        "Contents of every selected file",
        "{{selectedFileContents}}",
        Arc::new(SelectedFileContentsResolver::new(caps.files.clone())),
    ));
    defs.push(builtin(
        "file",
        &with_arg("file"),
        Effect::Pure,
        false,
        "Contents of the file at a path",
        "{{file:~/notes.md}}",
        Arc::new(FileResolver),
    ));

    for (name, transform, description) in [
        ("uppercase", Transform::Uppercase, "Converts text to upper case"),
        ("lowercase", Transform::Lowercase, "Converts text to lower case"),
        ("trim", Transform::Trim, "Removes surrounding whitespace"),
    ] {
        defs.push(builtin(
            name,
            &with_arg(name),
            Effect::Pure,
            true,
            description,
            &format!("{{{{{}: Hello World }}}}", name),
            Arc::new(TransformResolver::new(transform)),
        ));
    }

    defs.push(builtin(
        "get",
        r"\{\{get:([\w.-]+)\}\}",
        Effect::Pure,
        false,
        "Value of a variable set earlier in the prompt",
        "{{get:topic}}",
        Arc::new(GetResolver),
    ));
    defs.push(builtin(
        "set",
        &format!(r"\{{\{{set:([\w.-]+):{}\}}\}}", ARG),
        Effect::Pure,
        false,
        "Sets a variable for later placeholders; inserts nothing",
        "{{set:topic:rust}}",
        Arc::new(SetResolver),
    ));
    defs.push(builtin(
        "ignore",
        &with_arg("ignore"),
        Effect::Pure,
        true,
        "Runs nested placeholders but inserts nothing",
        "{{ignore:draft notes}}",
        Arc::new(IgnoreResolver),
    ));
    defs.push(builtin(
        "comment",
        &format!(r"\{{\{{#{}\}}\}}", ARG),
        Effect::Pure,
        true,
        "A comment; inserts nothing",
        "{{# note to self }}",
        Arc::new(IgnoreResolver),
    ));

    for (name, kind, description, example) in [
        (
            "shell",
            ScriptKind::Shell,
            "Output of a shell script",
            "{{shell:git log -1 --format=%s}}",
        ),
        (
            "as",
            ScriptKind::AppleScript,
            "Output of an AppleScript",
            "{{as:tell application \"Finder\" to get name of front window}}",
        ),
        (
            "js",
            ScriptKind::JavaScript,
            "Output of a JavaScript for Automation script",
            "{{js:Application('Finder').name()}}",
        ),
    ] {
        defs.push(builtin(
            name,
            &with_arg(name),
            Effect::Effectful,
            false,
            description,
            example,
            Arc::new(ScriptResolver::new(kind, caps.scripts.clone())),
        ));
    }

    defs.push(builtin(
        "url",
        &with_arg("url"),
        Effect::Effectful,
        false,
        "Visible text of a web page",
        "{{url:https://example.com}}",
        Arc::new(UrlResolver::new(caps.fetcher.clone())),
    ));
    defs.push(builtin(
        "link",
        r"\{\{(https?://[^\s{}]+)\}\}",
        Effect::Effectful,
        false,
        "Visible text of a web page, written as a bare link",
        "{{https://example.com}}",
        Arc::new(UrlResolver::new(caps.fetcher.clone())),
    ));
    defs.push(builtin(
        "cmd",
        &format!(r"\{{\{{cmd:([^:{{}}]+)(?::{})?\}}\}}", ARG),
        Effect::Effectful,
        false,
        "Opens another command with optional input; inserts nothing",
        "{{cmd:Summarize:some text}}",
        Arc::new(LaunchResolver::new(caps.launcher.clone())),
    ));

    debug!(count = defs.len(), "builtin::definitions: built");
    defs
}
