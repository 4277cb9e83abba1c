//! Error types for template resolution and rendering.
//!
//! This module provides [`RenderError`], the single error type returned by every
//! resolve and render operation. It abstracts over the underlying template
//! engines' errors, providing a stable public API.
//!
//! The type is `Clone`: a [`Template`](crate::Template) that failed to resolve
//! stores its error and hands out an identical copy on every render call.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Error type for template resolution and rendering.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The file reader could not load the template source.
    #[error("error reading template: {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// The selected parser rejected the template source.
    #[error("error parsing template: {0}")]
    Parse(Box<RenderError>),

    /// Template syntax error reported by an engine.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A raw string was resolved but no default parser was configured.
    #[error("no default parser configured")]
    NoDefaultParser,

    /// The engine failed while executing a parsed template.
    #[error("template error: {0}")]
    Execute(String),

    /// The render context reported an abort.
    #[error("{0}")]
    Aborted(String),

    /// Writing rendered output to a stream failed.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    #[error("error creating output directory(`{}`): {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("error opening file `{}`: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("error writing file `{}`: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("error closing file `{}`: {source}", .path.display())]
    CloseFile {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// The render context could not be converted to template data.
    #[error("error serializing render data: {0}")]
    Serialize(String),

    /// Rendered output was not valid UTF-8.
    #[error("rendered output is not valid UTF-8: {0}")]
    Utf8(String),

    /// Factory configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RenderError {
    /// Returns true if this error was produced by an abort signal.
    pub fn is_aborted(&self) -> bool {
        matches!(self, RenderError::Aborted(_))
    }

    /// Wraps an engine error as a parse failure.
    pub(crate) fn parse(inner: RenderError) -> Self {
        RenderError::Parse(Box::new(inner))
    }

    pub(crate) fn read(path: impl Into<PathBuf>, err: io::Error) -> Self {
        RenderError::Read {
            path: path.into(),
            source: Arc::new(err),
        }
    }
}

/// Result type for resolve and render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        RenderError::Io(Arc::new(err))
    }
}

impl From<std::string::FromUtf8Error> for RenderError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        RenderError::Utf8(err.to_string())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialize(err.to_string())
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::Config(err.to_string())
    }
}

// Syntax problems surface at parse time; everything else is an execution failure.
impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::SyntaxError | ErrorKind::BadEscape => RenderError::Syntax(err.to_string()),
            ErrorKind::WriteFailure => RenderError::Io(Arc::new(io::Error::other(err.to_string()))),
            _ => RenderError::Execute(err.to_string()),
        }
    }
}
