//! Executable templates.
//!
//! A [`Template`] is the result of resolving a template source through a
//! [`Factory`](crate::Factory). It is either ready to execute, or it carries
//! the failure that prevented it from being resolved:
//!
//! | Variant | Render behaviour |
//! |---------|------------------|
//! | [`Template::Ready`] | Runs the engine's [`Executor`], then polls the context for an abort |
//! | [`Template::Failed`] | Returns the stored error, without doing any work |
//!
//! Keeping failures inside the template lets a fluent chain such as
//! `factory.from_file(path).render_to_file(out, &ctx)` stay uniform: a missing
//! file or a syntax error surfaces exactly once, when output is requested.
//!
//! # Output targets
//!
//! - [`Template::render`]: rendered text
//! - [`Template::render_bytes`]: rendered bytes
//! - [`Template::render_to_writer`]: any [`io::Write`], unbuffered
//! - [`Template::render_to_file`]: a file path, or the [`STDOUT`] / [`STDERR`] sentinels

use std::fmt;
use std::fs::{DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{RenderError, Result};

/// Target name that streams [`Template::render_to_file`] output to standard output.
pub const STDOUT: &str = "stdout";

/// Target name that streams [`Template::render_to_file`] output to standard error.
pub const STDERR: &str = "stderr";

/// Executes a parsed template against a writer.
///
/// Engines implement this for their compiled form. Closures with the matching
/// signature implement it as well.
pub trait Executor: Send + Sync {
    fn execute(&self, out: &mut dyn Write, ctx: &dyn Context) -> Result<()>;
}

impl<F> Executor for F
where
    F: Fn(&mut dyn Write, &dyn Context) -> Result<()> + Send + Sync,
{
    fn execute(&self, out: &mut dyn Write, ctx: &dyn Context) -> Result<()> {
        self(out, ctx)
    }
}

/// A resolved template: ready to execute, or failed with a deferred error.
///
/// Cloning is cheap; the executor is shared.
#[derive(Clone)]
pub enum Template {
    Ready(Arc<dyn Executor>),
    Failed(RenderError),
}

impl Template {
    /// Wraps an engine executor.
    pub fn from_executor(executor: impl Executor + 'static) -> Self {
        Template::Ready(Arc::new(executor))
    }

    /// Wraps a closure as the executor.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Write, &dyn Context) -> Result<()> + Send + Sync + 'static,
    {
        Template::Ready(Arc::new(f))
    }

    /// Creates a template that fails every render with `err`.
    pub fn failed(err: RenderError) -> Self {
        Template::Failed(err)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Template::Failed(_))
    }

    /// The deferred error, if resolution failed.
    pub fn error(&self) -> Option<&RenderError> {
        match self {
            Template::Ready(_) => None,
            Template::Failed(err) => Some(err),
        }
    }

    /// Renders into `out`.
    ///
    /// After the engine returns, the context's abort capability is polled; a
    /// reported abort is returned in preference to the execution result.
    /// Output already written to `out` is not retracted.
    pub fn render_to_writer(&self, out: &mut dyn Write, ctx: &dyn Context) -> Result<()> {
        let executor = match self {
            Template::Ready(executor) => executor,
            Template::Failed(err) => return Err(err.clone()),
        };

        let result = executor.execute(out, ctx);

        if let Some(abort) = ctx.aborted() {
            tracing::debug!(reason = %abort, "render aborted by context");
            return Err(abort);
        }

        result
    }

    /// Renders into an in-memory buffer.
    pub fn render_bytes(&self, ctx: &dyn Context) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.render_to_writer(&mut buf, ctx)?;
        Ok(buf)
    }

    /// Renders to a string.
    pub fn render(&self, ctx: &dyn Context) -> Result<String> {
        let bytes = self.render_bytes(ctx)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Renders to a file.
    ///
    /// [`STDOUT`] and [`STDERR`] stream straight to the process streams.
    /// Any other path is rendered into memory first, so a failed or aborted
    /// render never touches the filesystem. Missing parent directories are
    /// created owner-only (`0700`) and the file is created or truncated with
    /// mode `0600`.
    ///
    /// If both writing and closing the file fail, the close error is returned.
    pub fn render_to_file(&self, path: impl AsRef<Path>, ctx: &dyn Context) -> Result<()> {
        let path = path.as_ref();

        if let Template::Failed(err) = self {
            return Err(err.clone());
        }

        if path == Path::new(STDOUT) {
            return self.render_to_writer(&mut io::stdout().lock(), ctx);
        }
        if path == Path::new(STDERR) {
            return self.render_to_writer(&mut io::stderr().lock(), ctx);
        }

        let bytes = self.render_bytes(ctx)?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            dir_builder()
                .create(dir)
                .map_err(|source| RenderError::CreateDir {
                    path: dir.to_path_buf(),
                    source: Arc::new(source),
                })?;
        }

        let mut file = open_options()
            .open(path)
            .map_err(|source| RenderError::OpenFile {
                path: path.to_path_buf(),
                source: Arc::new(source),
            })?;

        let written = file
            .write_all(&bytes)
            .map_err(|source| RenderError::WriteFile {
                path: path.to_path_buf(),
                source: Arc::new(source),
            });

        let closed = close(file).map_err(|source| RenderError::CloseFile {
            path: path.to_path_buf(),
            source: Arc::new(source),
        });

        write_outcome(written, closed)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote rendered template");
        Ok(())
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Ready(_) => f.write_str("Template::Ready(..)"),
            Template::Failed(err) => f.debug_tuple("Template::Failed").field(err).finish(),
        }
    }
}

impl From<RenderError> for Template {
    fn from(err: RenderError) -> Self {
        Template::Failed(err)
    }
}

/// Closes an output file, reporting a failure to persist it.
///
/// Dropping a `File` discards close errors, so regular files are synced
/// first. Devices and pipes reject `fsync` and are closed by drop alone.
fn close(file: File) -> io::Result<()> {
    if file.metadata()?.is_file() {
        file.sync_all()?;
    }
    Ok(())
}

/// A close failure takes precedence over a write failure.
fn write_outcome(written: Result<()>, closed: Result<()>) -> Result<()> {
    closed.and(written)
}

fn dir_builder() -> DirBuilder {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
}

fn open_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}
