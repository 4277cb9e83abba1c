//! # Plates - Fluent Template Rendering
//!
//! `plates` resolves template sources into executable [`Template`]s, choosing
//! the template engine at runtime, and renders them through one uniform
//! interface regardless of the syntax used.
//!
//! ## Core Concepts
//!
//! - [`Factory`]: fluent builder holding functions, matchers, a default parser
//!   and a file reader
//! - [`Parser`]: turns source text into a [`Template`] for one template dialect
//! - [`Matcher`]: picks a parser from a file name; the first match wins
//! - [`Template`]: render to a string, bytes, a writer, or a file
//! - [`Functions`]: named functions exposed to template bodies
//! - [`Context`]: render data, optionally able to abort a render
//! - [`TemplateCache`]: thread-safe memoization of resolved templates
//!
//! ## Quick Start
//!
//! ```rust
//! use plates::{engine, Factory};
//! use serde_json::json;
//!
//! let factory = Factory::new("quickstart")
//!     .default_parser(engine::text_parser)
//!     .with_stdlib();
//!
//! let out = factory
//!     .from_source("Hello {{name}}")
//!     .render(&json!({"name": "World"}))
//!     .unwrap();
//! assert_eq!(out, "Hello World");
//! ```
//!
//! ## Deferred Errors
//!
//! Resolving never fails on the spot. A missing file or a syntax error is kept
//! inside the returned template and reported by the first render call, so
//! fluent chains stay uniform:
//!
//! ```rust
//! use plates::{engine, Factory};
//!
//! let err = Factory::new("deferred")
//!     .default_parser(engine::text_parser)
//!     .from_file("does/not/exist.tmpl")
//!     .render_to_file("out.txt", &())
//!     .unwrap_err();
//! assert!(err.to_string().starts_with("error reading template: does/not/exist.tmpl"));
//! ```
//!
//! ## Aborting a Render
//!
//! Template logic can abort through a context that carries an
//! [`AbortSignal`]. The abort wins over the engine's own result and keeps
//! [`Template::render_to_file`] from writing anything. See [`context`].
//!
//! ## Engines
//!
//! The [`engine`] module bundles a text engine, an HTML-escaping engine and a
//! positional format engine. Other engines plug in by implementing [`Parser`]
//! and [`Executor`].

pub mod cache;
pub mod config;
pub mod context;
pub mod engine;
mod error;
pub mod factory;
mod functions;
pub mod prelude;
pub mod template;

pub use cache::TemplateCache;
pub use config::{FactoryConfig, MatcherConfig};
pub use context::{AbortSignal, Abortable, Context, Data, DEFAULT_ABORT_REASON};
pub use engine::EngineKind;
pub use error::{RenderError, Result};
pub use factory::{Factory, FileReader, FsReader, Matcher, Parser};
pub use functions::{Function, FunctionError, Functions};
pub use template::{Executor, Template, STDERR, STDOUT};
