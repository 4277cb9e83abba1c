//! Bundled template engines and their file-name matchers.
//!
//! | Engine | Parser | Suffixes |
//! |--------|--------|----------|
//! | Text (MiniJinja, no escaping) | [`text_parser`] | `.txt.tpl`, `.tmpl`, `.txt.jinja`, `.txt.j2` |
//! | HTML (MiniJinja, HTML escaping) | [`html_parser`] | `.html.tpl`, `.htm.tpl`, `.html.jinja`, `.html.j2` |
//! | Format (positional) | [`format_parser`] | `.format`, `.string`, `.fmt` |
//!
//! Each engine has a matcher function (`match_text`, `match_html`,
//! `match_format`) suitable for [`Factory::add_matcher_fn`](crate::Factory::add_matcher_fn).
//! [`stdlib_matchers`] returns all three in that order.

mod format;
mod jinja;

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::factory::{Matcher, Parser};
use crate::functions::Functions;
use crate::template::Template;

pub use format::{format_parser, FormatString};
pub use jinja::{html_parser, text_parser};

/// File suffixes handled by the text engine.
pub const TEXT_SUFFIXES: &[&str] = &[".txt.tpl", ".tmpl", ".txt.jinja", ".txt.j2"];

/// File suffixes handled by the HTML engine.
pub const HTML_SUFFIXES: &[&str] = &[".html.tpl", ".htm.tpl", ".html.jinja", ".html.j2"];

/// File suffixes handled by the format engine.
pub const FORMAT_SUFFIXES: &[&str] = &[".format", ".string", ".fmt"];

/// The bundled engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Text,
    Html,
    Format,
}

static TEXT: Lazy<Arc<dyn Parser>> = Lazy::new(|| Arc::new(EngineKind::Text));
static HTML: Lazy<Arc<dyn Parser>> = Lazy::new(|| Arc::new(EngineKind::Html));
static FORMAT: Lazy<Arc<dyn Parser>> = Lazy::new(|| Arc::new(EngineKind::Format));

impl EngineKind {
    pub const ALL: [EngineKind; 3] = [EngineKind::Text, EngineKind::Html, EngineKind::Format];

    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Text => "text",
            EngineKind::Html => "html",
            EngineKind::Format => "format",
        }
    }

    /// Default file suffixes for this engine.
    pub fn suffixes(self) -> &'static [&'static str] {
        match self {
            EngineKind::Text => TEXT_SUFFIXES,
            EngineKind::Html => HTML_SUFFIXES,
            EngineKind::Format => FORMAT_SUFFIXES,
        }
    }

    /// Returns true if `filename` ends with one of this engine's suffixes.
    pub fn matches(self, filename: &str) -> bool {
        self.suffixes().iter().any(|ext| filename.ends_with(ext))
    }

    /// Shared parser for this engine.
    pub fn parser(self) -> Arc<dyn Parser> {
        match self {
            EngineKind::Text => Arc::clone(&TEXT),
            EngineKind::Html => Arc::clone(&HTML),
            EngineKind::Format => Arc::clone(&FORMAT),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Parser for EngineKind {
    fn parse(&self, name: &str, funcs: &Functions, source: &str) -> Result<Template> {
        match self {
            EngineKind::Text => text_parser(name, funcs, source),
            EngineKind::Html => html_parser(name, funcs, source),
            EngineKind::Format => format_parser(name, funcs, source),
        }
    }
}

fn match_kind(kind: EngineKind, filename: &str) -> Option<Arc<dyn Parser>> {
    kind.matches(filename).then(|| kind.parser())
}

/// Selects the text engine for [`TEXT_SUFFIXES`].
pub fn match_text(filename: &str) -> Option<Arc<dyn Parser>> {
    match_kind(EngineKind::Text, filename)
}

/// Selects the HTML engine for [`HTML_SUFFIXES`].
pub fn match_html(filename: &str) -> Option<Arc<dyn Parser>> {
    match_kind(EngineKind::Html, filename)
}

/// Selects the format engine for [`FORMAT_SUFFIXES`].
pub fn match_format(filename: &str) -> Option<Arc<dyn Parser>> {
    match_kind(EngineKind::Format, filename)
}

/// A matcher function pointer, as returned by [`stdlib_matchers`].
pub type MatcherFn = fn(&str) -> Option<Arc<dyn Parser>>;

/// The bundled matchers: text, html, format.
pub fn stdlib_matchers() -> Vec<MatcherFn> {
    vec![match_text, match_html, match_format]
}

/// Matches file names against a list of suffixes.
///
/// Used for matchers declared in configuration.
#[derive(Clone)]
pub struct SuffixMatcher {
    suffixes: Vec<String>,
    parser: Arc<dyn Parser>,
}

impl SuffixMatcher {
    pub fn new<I, S>(suffixes: I, parser: Arc<dyn Parser>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
            parser,
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

impl Matcher for SuffixMatcher {
    fn matches(&self, filename: &str) -> Option<Arc<dyn Parser>> {
        self.suffixes
            .iter()
            .any(|ext| filename.ends_with(ext.as_str()))
            .then(|| Arc::clone(&self.parser))
    }
}

impl fmt::Debug for SuffixMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuffixMatcher")
            .field("suffixes", &self.suffixes)
            .finish()
    }
}
