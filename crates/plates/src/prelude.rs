//! Prelude for convenient imports.
//!
//! Re-exports the types needed to configure a factory and render templates:
//!
//! ```rust
//! use plates::prelude::*;
//! use serde_json::json;
//!
//! let out = Factory::new("app")
//!     .default_parser(text_parser)
//!     .from_source("{{ a }}+{{ b }}")
//!     .render(&json!({"a": 1, "b": 2}))
//!     .unwrap();
//! assert_eq!(out, "1+2");
//! ```

// Facade and templates
pub use crate::factory::{Factory, FileReader, Matcher, Parser};
pub use crate::template::{Executor, Template};

// Contexts
pub use crate::context::{AbortSignal, Abortable, Context, Data};

// Functions and errors
pub use crate::error::RenderError;
pub use crate::functions::{FunctionError, Functions};

// Bundled engines
pub use crate::engine::{format_parser, html_parser, stdlib_matchers, text_parser, EngineKind};
