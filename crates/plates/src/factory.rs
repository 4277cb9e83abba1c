//! Engine selection and template resolution.
//!
//! [`Factory`] is the fluent entry point. It accumulates configuration (template
//! functions, matchers, a default parser, a file reader) and resolves template
//! sources into [`Template`]s.
//!
//! ## Resolution
//!
//! | Method | Engine selection |
//! |--------|------------------|
//! | [`Factory::from_source`] | Default parser only |
//! | [`Factory::from_named`] | Matchers against the name, then the default parser |
//! | [`Factory::from_file`] | Reads the file, then as `from_named` with the path |
//!
//! Matchers are consulted in registration order and the first one returning a
//! parser wins; later matchers are never asked.
//!
//! Resolution never fails synchronously. A read or parse failure is stored in
//! a [`Template::Failed`] and returned by the first render call.
//!
//! ## Example
//!
//! ```rust
//! use plates::{engine, Factory, Functions};
//! use serde_json::{json, Value};
//!
//! let funcs = Functions::new().with("shout", |args: &[Value]| {
//!     let s = args.first().and_then(Value::as_str).unwrap_or_default();
//!     Ok(json!(s.to_uppercase()))
//! });
//!
//! let factory = Factory::new("docs")
//!     .default_parser(engine::text_parser)
//!     .add_funcs([&funcs])
//!     .with_stdlib();
//!
//! let out = factory
//!     .from_named("greeting.txt.tpl", "Hello {{ shout(name) }}")
//!     .render(&json!({"name": "world"}))
//!     .unwrap();
//! assert_eq!(out, "Hello WORLD");
//!
//! let page = factory
//!     .from_named("page.html.tpl", "<p>{{ body }}</p>")
//!     .render(&json!({"body": "<script>"}))
//!     .unwrap();
//! assert_eq!(page, "<p>&lt;script&gt;</p>");
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::engine;
use crate::error::{RenderError, Result};
use crate::functions::{FunctionError, Functions};
use crate::template::Template;

/// Turns template source into an executable [`Template`].
///
/// `name` is the factory label, forwarded for diagnostics. Implementations
/// must copy whatever they need from `funcs`; the registry is not retained.
pub trait Parser: Send + Sync {
    fn parse(&self, name: &str, funcs: &Functions, source: &str) -> Result<Template>;
}

impl<F> Parser for F
where
    F: Fn(&str, &Functions, &str) -> Result<Template> + Send + Sync,
{
    fn parse(&self, name: &str, funcs: &Functions, source: &str) -> Result<Template> {
        self(name, funcs, source)
    }
}

/// Selects a [`Parser`] for a file name.
///
/// Matching is pure and total: no match is `None`, never an error.
pub trait Matcher: Send + Sync {
    fn matches(&self, filename: &str) -> Option<Arc<dyn Parser>>;
}

impl<F> Matcher for F
where
    F: Fn(&str) -> Option<Arc<dyn Parser>> + Send + Sync,
{
    fn matches(&self, filename: &str) -> Option<Arc<dyn Parser>> {
        self(filename)
    }
}

/// Loads template source for [`Factory::from_file`].
pub trait FileReader: Send + Sync {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
}

impl<F> FileReader for F
where
    F: Fn(&Path) -> io::Result<Vec<u8>> + Send + Sync,
{
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self(path)
    }
}

/// Reads templates from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl FileReader for FsReader {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Fluent template factory with runtime engine selection.
///
/// Configure the factory fully before resolving templates from several
/// threads: resolution only reads the configuration, but nothing guards it
/// against concurrent reconfiguration.
#[derive(Clone)]
pub struct Factory {
    name: String,
    file_reader: Arc<dyn FileReader>,
    funcs: Functions,
    default_parser: Option<Arc<dyn Parser>>,
    matchers: Vec<Arc<dyn Matcher>>,
}

impl Factory {
    /// Creates a factory reading from the filesystem, with no functions,
    /// no matchers and no default parser.
    ///
    /// `name` is an arbitrary label passed to the engines.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_reader: Arc::new(FsReader),
            funcs: Functions::new(),
            default_parser: None,
            matchers: Vec::new(),
        }
    }

    /// Replaces how [`from_file`](Self::from_file) loads templates.
    pub fn file_reader(mut self, reader: impl FileReader + 'static) -> Self {
        self.file_reader = Arc::new(reader);
        self
    }

    /// Closure form of [`file_reader`](Self::file_reader).
    pub fn file_reader_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Path) -> io::Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.file_reader(f)
    }

    /// Merges function registries into the factory's registry.
    ///
    /// Later registries win on name collision.
    pub fn add_funcs<'a, I>(mut self, registries: I) -> Self
    where
        I: IntoIterator<Item = &'a Functions>,
    {
        self.funcs.add(registries);
        self
    }

    /// Registers a single template function.
    pub fn add_func<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[serde_json::Value]) -> std::result::Result<serde_json::Value, FunctionError>
            + Send
            + Sync
            + 'static,
    {
        self.funcs.insert(name, f);
        self
    }

    /// Appends a matcher. Matchers are consulted in the order added.
    pub fn add_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matchers.push(Arc::new(matcher));
        self
    }

    /// Appends several matchers, preserving their order.
    pub fn add_matchers<M, I>(mut self, matchers: I) -> Self
    where
        M: Matcher + 'static,
        I: IntoIterator<Item = M>,
    {
        for matcher in matchers {
            self.matchers.push(Arc::new(matcher));
        }
        self
    }

    /// Closure form of [`add_matcher`](Self::add_matcher).
    pub fn add_matcher_fn<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> Option<Arc<dyn Parser>> + Send + Sync + 'static,
    {
        self.add_matcher(f)
    }

    /// Appends the bundled engine matchers (text, html, format).
    pub fn with_stdlib(self) -> Self {
        self.add_matchers(engine::stdlib_matchers())
    }

    /// Sets the parser used when no matcher applies.
    pub fn default_parser(mut self, parser: impl Parser + 'static) -> Self {
        self.default_parser = Some(Arc::new(parser));
        self
    }

    /// Closure form of [`default_parser`](Self::default_parser).
    pub fn default_parser_fn<F>(self, f: F) -> Self
    where
        F: Fn(&str, &Functions, &str) -> Result<Template> + Send + Sync + 'static,
    {
        self.default_parser(f)
    }

    /// Sets an already shared parser as the default.
    pub fn default_parser_arc(mut self, parser: Arc<dyn Parser>) -> Self {
        self.default_parser = Some(parser);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> &Functions {
        &self.funcs
    }

    pub fn matcher_count(&self) -> usize {
        self.matchers.len()
    }

    /// Returns the parser of the first matcher that accepts `filename`.
    pub fn select(&self, filename: &str) -> Option<Arc<dyn Parser>> {
        self.matchers.iter().find_map(|m| m.matches(filename))
    }

    /// Reads and resolves a template file.
    ///
    /// A read failure, including content that is not UTF-8, is deferred
    /// without consulting any parser.
    pub fn from_file(&self, path: impl AsRef<Path>) -> Template {
        let path = path.as_ref();
        let source = self.file_reader.read_file(path).and_then(decode_utf8);

        match source {
            Ok(source) => self.from_named(&path.to_string_lossy(), &source),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "deferring template read failure");
                Template::failed(RenderError::read(path, err))
            }
        }
    }

    /// Resolves `source`, selecting the engine by matching `name`.
    pub fn from_named(&self, name: &str, source: &str) -> Template {
        match self.select(name) {
            Some(parser) => {
                tracing::trace!(name, "matcher selected parser");
                self.parse_with(parser.as_ref(), source)
            }
            None => {
                tracing::trace!(name, "no matcher applies, using default parser");
                self.from_source(source)
            }
        }
    }

    /// Resolves `source` with the default parser.
    pub fn from_source(&self, source: &str) -> Template {
        match &self.default_parser {
            Some(parser) => self.parse_with(parser.as_ref(), source),
            None => Template::failed(RenderError::parse(RenderError::NoDefaultParser)),
        }
    }

    fn parse_with(&self, parser: &dyn Parser, source: &str) -> Template {
        match parser.parse(&self.name, &self.funcs, source) {
            Ok(template) => template,
            Err(err) => {
                tracing::debug!(factory = %self.name, error = %err, "deferring template parse failure");
                Template::failed(RenderError::parse(err))
            }
        }
    }
}

fn decode_utf8(bytes: Vec<u8>) -> io::Result<String> {
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("name", &self.name)
            .field("funcs", &self.funcs)
            .field("matchers", &self.matchers.len())
            .field("default_parser", &self.default_parser.is_some())
            .finish()
    }
}
