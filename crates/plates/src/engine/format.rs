//! Positional format engine.
//!
//! A lightweight engine for one-line messages and file names, using
//! format-string style placeholders instead of a template language.
//!
//! # Syntax
//!
//! - `{}` - the next positional argument
//! - `{0}`, `{1}` - an explicit argument by index
//! - `{{` and `}}` - escaped braces (render as `{` and `}`)
//!
//! Array data supplies the argument list; any other value is the single
//! argument, and `null` supplies none.
//!
//! ```rust
//! use plates::engine::format_parser;
//! use plates::Functions;
//! use serde_json::json;
//!
//! let tmpl = format_parser("msg", &Functions::new(), "{} scored {1}, {}!").unwrap();
//! assert_eq!(tmpl.render(&json!(["Ada", 42])).unwrap(), "Ada scored 42, 42!");
//! ```
//!
//! A placeholder with no matching argument is rendered back verbatim, so a
//! short argument list shows up in the output rather than failing the render.
//! Registered functions are not available to this engine.

use std::io::Write;

use serde_json::Value;

use crate::context::Context;
use crate::error::{RenderError, Result};
use crate::functions::Functions;
use crate::template::{Executor, Template};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Next,
    Index(usize),
}

/// A parsed positional format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatString {
    segments: Vec<Segment>,
}

impl FormatString {
    /// Parses `source`, rejecting unclosed or non-numeric placeholders.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' if chars.peek().map(|&(_, c)| c) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut spec = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        spec.push(inner);
                    }

                    if !closed {
                        return Err(RenderError::Syntax(format!(
                            "unclosed placeholder at byte {}",
                            pos
                        )));
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }

                    let spec = spec.trim();
                    if spec.is_empty() {
                        segments.push(Segment::Next);
                    } else {
                        let index = spec.parse::<usize>().map_err(|_| {
                            RenderError::Syntax(format!("invalid placeholder `{{{}}}`", spec))
                        })?;
                        segments.push(Segment::Index(index));
                    }
                }
                '}' if chars.peek().map(|&(_, c)| c) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                // Stray closing brace
                _ => literal.push(ch),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Number of placeholders in the format string.
    pub fn placeholder_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| !matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Formats the arguments into a string.
    pub fn format(&self, args: &[Value]) -> String {
        let mut out = String::new();
        let mut next = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Next => {
                    match args.get(next) {
                        Some(value) => out.push_str(&format_value(value)),
                        None => out.push_str("{}"),
                    }
                    next += 1;
                }
                Segment::Index(index) => match args.get(*index) {
                    Some(value) => out.push_str(&format_value(value)),
                    None => out.push_str(&format!("{{{}}}", index)),
                },
            }
        }

        out
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn arguments(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

impl Executor for FormatString {
    fn execute(&self, out: &mut dyn Write, ctx: &dyn Context) -> Result<()> {
        let args = arguments(ctx.to_value()?);
        out.write_all(self.format(&args).as_bytes())?;
        Ok(())
    }
}

/// Parses a positional format string. Functions are ignored.
pub fn format_parser(_name: &str, _funcs: &Functions, source: &str) -> Result<Template> {
    Ok(Template::from_executor(FormatString::parse(source)?))
}
