//! # plates-tera - Tera Engine for plates
//!
//! Adds the [Tera](https://keats.github.io/tera/) expression language as a
//! `plates` engine. Register [`match_tera`] on a factory to route `.tera`
//! files here, or use [`parser`] as the default parser.
//!
//! ```rust
//! use plates::{engine, Factory, Functions};
//! use serde_json::{json, Value};
//!
//! let funcs = Functions::new().with("shout", |args: &[Value]| {
//!     let text = args[0]["text"].as_str().unwrap_or_default();
//!     Ok(json!(text.to_uppercase()))
//! });
//!
//! let factory = Factory::new("docs")
//!     .default_parser(engine::text_parser)
//!     .add_funcs([&funcs])
//!     .add_matcher_fn(plates_tera::match_tera);
//!
//! let out = factory
//!     .from_named("hello.tera", "{{ shout(text=name) }}!")
//!     .render(&json!({"name": "world"}))
//!     .unwrap();
//! assert_eq!(out, "WORLD!");
//! ```
//!
//! # Template scope
//!
//! - Top-level keys of object data are variables.
//! - `data` holds the whole context value, unless the data has its own `data` key.
//! - `abort(reason="...")` is available when the context carries an
//!   [`AbortSignal`](plates::AbortSignal).
//!
//! Tera calls functions with named arguments only. Registry functions receive
//! them as a single object, so `{{ f(a=1, b="x") }}` calls `f` with
//! `[{"a": 1, "b": "x"}]`.
//!
//! Output is never auto-escaped; use Tera's `escape` filter where needed.

use std::collections::HashMap;
use std::error::Error as _;
use std::io::Write;
use std::sync::Arc;

use plates::{AbortSignal, Context, Functions, Parser, RenderError, Template};
use plates::DEFAULT_ABORT_REASON;
use serde_json::Value;
use tera::Tera;

/// File suffixes handled by the Tera engine.
pub const SUFFIXES: &[&str] = &[".tera", ".tpl.tera"];

/// Parses a Tera template.
pub fn parser(name: &str, funcs: &Functions, source: &str) -> plates::Result<Template> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    register_functions(&mut tera, funcs);

    tera.add_raw_template(name, source)
        .map_err(|err| RenderError::Syntax(describe(&err)))?;

    tracing::debug!(name, functions = funcs.len(), "compiled tera template");
    Ok(Template::from_executor(TeraExecutor {
        tera,
        name: name.to_string(),
    }))
}

/// Selects the Tera engine for [`SUFFIXES`].
pub fn match_tera(filename: &str) -> Option<Arc<dyn Parser>> {
    SUFFIXES
        .iter()
        .any(|ext| filename.ends_with(ext))
        .then(|| Arc::new(parser) as Arc<dyn Parser>)
}

struct TeraExecutor {
    tera: Tera,
    name: String,
}

impl plates::Executor for TeraExecutor {
    fn execute(&self, out: &mut dyn Write, ctx: &dyn Context) -> plates::Result<()> {
        let scope = scope(ctx)?;

        let result = match ctx.abort_signal() {
            // Functions are fixed per instance, so abort needs a private copy.
            Some(signal) => {
                let mut tera = self.tera.clone();
                register_abort(&mut tera, signal);
                tera.render_to(&self.name, &scope, out)
            }
            None => self.tera.render_to(&self.name, &scope, out),
        };

        result.map_err(|err| RenderError::Execute(describe(&err)))
    }
}

fn register_functions(tera: &mut Tera, funcs: &Functions) {
    for (name, f) in funcs.iter() {
        let f = Arc::clone(f);
        let fname = name.to_string();
        let bridge = move |args: &HashMap<String, Value>| -> tera::Result<Value> {
            let named: serde_json::Map<String, Value> =
                args.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            f(&[Value::Object(named)]).map_err(|e| {
                tera::Error::msg(format!("function `{}` failed: {}", fname, e))
            })
        };
        tera.register_function(name, bridge);
    }
}

fn register_abort(tera: &mut Tera, signal: AbortSignal) {
    let abort = move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let reason = args
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ABORT_REASON);
        signal.abort(reason);
        Ok(Value::String(String::new()))
    };
    tera.register_function("abort", abort);
}

fn scope(ctx: &dyn Context) -> plates::Result<tera::Context> {
    let data = ctx.to_value()?;
    let mut scope = tera::Context::new();

    if let Value::Object(map) = &data {
        for (key, value) in map {
            scope.insert(key.as_str(), value);
        }
    }
    if !scope.contains_key("data") {
        scope.insert("data", &data);
    }

    Ok(scope)
}

/// Tera keeps the useful detail in the source chain; flatten it.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
