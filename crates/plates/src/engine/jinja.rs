//! MiniJinja-backed text and HTML engines.
//!
//! Both engines compile the source once, at parse time, into a private
//! MiniJinja environment holding the factory's functions. They differ only in
//! escaping: the text engine emits values verbatim, the HTML engine escapes
//! every value it prints.
//!
//! Undefined variables are errors. Use `{% if x is defined %}` for optional
//! data.
//!
//! # Template scope
//!
//! - Top-level keys of object data are variables (`{{ name }}`).
//! - `data` holds the whole context value, unless the data has its own `data` key.
//! - `abort()` / `abort("reason")` is available when the context carries an
//!   [`AbortSignal`](crate::AbortSignal).

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use minijinja::value::{Rest, Value};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior};

use crate::context::{Context, DEFAULT_ABORT_REASON};
use crate::error::Result;
use crate::functions::Functions;
use crate::template::{Executor, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escaping {
    None,
    Html,
}

/// Parses a plain-text template.
pub fn text_parser(name: &str, funcs: &Functions, source: &str) -> Result<Template> {
    compile(name, funcs, source, Escaping::None)
}

/// Parses an HTML template; printed values are HTML-escaped.
pub fn html_parser(name: &str, funcs: &Functions, source: &str) -> Result<Template> {
    compile(name, funcs, source, Escaping::Html)
}

struct JinjaExecutor {
    env: Environment<'static>,
    name: String,
}

fn compile(name: &str, funcs: &Functions, source: &str, escaping: Escaping) -> Result<Template> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    match escaping {
        Escaping::None => env.set_auto_escape_callback(|_| AutoEscape::None),
        Escaping::Html => env.set_auto_escape_callback(|_| AutoEscape::Html),
    }
    register_functions(&mut env, funcs);

    env.add_template_owned(name.to_string(), source.to_string())?;

    Ok(Template::from_executor(JinjaExecutor {
        env,
        name: name.to_string(),
    }))
}

/// Binds registry functions into the environment.
///
/// Arguments and results cross the boundary as JSON values.
fn register_functions(env: &mut Environment<'static>, funcs: &Functions) {
    for (name, f) in funcs.iter() {
        let f = Arc::clone(f);
        let fname = name.to_string();
        let bridge = move |args: Rest<Value>| -> std::result::Result<Value, Error> {
            let json_args = args
                .iter()
                .map(|arg| {
                    serde_json::to_value(arg)
                        .map_err(|e| Error::new(ErrorKind::BadSerialization, e.to_string()))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let result = f(&json_args).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("function `{}` failed: {}", fname, e),
                )
            })?;

            Ok(Value::from_serialize(&result))
        };
        env.add_function(name.to_string(), bridge);
    }
}

fn root_scope(ctx: &dyn Context) -> Result<Value> {
    let data = ctx.to_value()?;
    let mut root: BTreeMap<String, Value> = BTreeMap::new();

    if let serde_json::Value::Object(map) = &data {
        for (key, value) in map {
            root.insert(key.clone(), Value::from_serialize(value));
        }
    }
    root.entry("data".to_string())
        .or_insert_with(|| Value::from_serialize(&data));

    if let Some(signal) = ctx.abort_signal() {
        root.insert(
            "abort".to_string(),
            Value::from_function(move |reason: Option<String>| -> String {
                let reason = reason.unwrap_or_else(|| DEFAULT_ABORT_REASON.to_string());
                signal.abort(reason);
                String::new()
            }),
        );
    }

    Ok(Value::from_iter(root))
}

impl Executor for JinjaExecutor {
    fn execute(&self, out: &mut dyn Write, ctx: &dyn Context) -> Result<()> {
        let tmpl = self.env.get_template(&self.name)?;
        tmpl.render_to_write(root_scope(ctx)?, out)?;
        Ok(())
    }
}
