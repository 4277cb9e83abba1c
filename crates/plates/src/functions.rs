//! Named functions exposed to template bodies.
//!
//! A [`Functions`] registry maps names to engine-agnostic callables. Every
//! callable takes its positional arguments as JSON values and returns a JSON
//! value, so the same registry can be bound into any bundled engine.
//!
//! # Merging
//!
//! Registries are merged with [`Functions::add`]. Later registries overwrite
//! earlier ones on name collision, in call order:
//!
//! ```rust
//! use plates::Functions;
//! use serde_json::{json, Value};
//!
//! let mut funcs = Functions::new().with("greet", |_: &[Value]| Ok(json!("hi")));
//! let overrides = Functions::new().with("greet", |_: &[Value]| Ok(json!("hello")));
//! funcs.add([&overrides]);
//!
//! let greet = funcs.get("greet").unwrap();
//! assert_eq!(greet(&[]).unwrap(), json!("hello"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Error returned by a template function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FunctionError(String);

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// A callable template function.
pub type Function = Arc<dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync>;

/// Registry of named template functions.
///
/// Cloning is cheap: entries are reference counted, so a parser can take a
/// private copy of the registry it was handed.
#[derive(Clone, Default)]
pub struct Functions {
    entries: BTreeMap<String, Function>,
}

impl Functions {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function, returning the registry for chaining.
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.insert(name, f);
        self
    }

    /// Registers a function, replacing any existing function with that name.
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(f));
    }

    /// Merges the given registries into this one, in order.
    pub fn add<'a, I>(&mut self, registries: I)
    where
        I: IntoIterator<Item = &'a Functions>,
    {
        for registry in registries {
            for (name, f) in &registry.entries {
                self.entries.insert(name.clone(), Arc::clone(f));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.entries.iter().map(|(name, f)| (name.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Functions")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FromIterator<(String, Function)> for Functions {
    fn from_iter<I: IntoIterator<Item = (String, Function)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constant(value: &'static str) -> impl Fn(&[Value]) -> Result<Value, FunctionError> {
        move |_| Ok(json!(value))
    }

    #[test]
    fn test_insert_and_call() {
        let funcs = Functions::new().with("upper", |args: &[Value]| {
            let s = args.first().and_then(Value::as_str).unwrap_or_default();
            Ok(json!(s.to_uppercase()))
        });

        let upper = funcs.get("upper").unwrap();
        assert_eq!(upper(&[json!("abc")]).unwrap(), json!("ABC"));
    }

    #[test]
    fn test_merge_last_writer_wins() {
        let mut base = Functions::new()
            .with("a", constant("a1"))
            .with("b", constant("b1"));
        let second = Functions::new()
            .with("b", constant("b2"))
            .with("c", constant("c2"));
        let third = Functions::new().with("c", constant("c3"));

        base.add([&second, &third]);

        assert_eq!(base.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(base.get("a").unwrap()(&[]).unwrap(), json!("a1"));
        assert_eq!(base.get("b").unwrap()(&[]).unwrap(), json!("b2"));
        assert_eq!(base.get("c").unwrap()(&[]).unwrap(), json!("c3"));
    }

    #[test]
    fn test_merge_does_not_alias_source() {
        let mut target = Functions::new();
        let mut source = Functions::new().with("x", constant("x1"));
        target.add([&source]);

        source.insert("x", constant("x2"));
        source.insert("y", constant("y2"));

        assert_eq!(target.len(), 1);
        assert_eq!(target.get("x").unwrap()(&[]).unwrap(), json!("x1"));
    }

    #[test]
    fn test_function_error() {
        let funcs = Functions::new().with("fail", |_: &[Value]| Err(FunctionError::new("nope")));
        let err = funcs.get("fail").unwrap()(&[]).unwrap_err();
        assert_eq!(err.message(), "nope");
    }

    #[test]
    fn test_collect_from_pairs() {
        let one: Function = Arc::new(constant("1"));
        let two: Function = Arc::new(constant("2"));
        let pairs = vec![("one".to_string(), one), ("two".to_string(), two)];
        let funcs: Functions = pairs.into_iter().collect();

        assert_eq!(funcs.len(), 2);
        assert_eq!(funcs.get("two").unwrap()(&[]).unwrap(), json!("2"));
    }

    #[test]
    fn test_empty() {
        let funcs = Functions::new();
        assert!(funcs.is_empty());
        assert!(!funcs.contains("anything"));
    }
}
