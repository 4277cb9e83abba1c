//! Declarative factory configuration.
//!
//! A [`FactoryConfig`] describes engine selection in YAML, so applications
//! can let users map their own file suffixes to the bundled engines:
//!
//! ```yaml
//! default: text
//! matchers:
//!   - engine: html
//!     suffixes: [".page", ".partial"]
//!   - engine: format
//!     suffixes: [".msg"]
//! stdlib: true
//! ```
//!
//! Configured matchers are consulted first, in file order. With `stdlib: true`
//! the bundled suffix matchers are appended after them.
//!
//! ```rust
//! use plates::{Factory, FactoryConfig};
//! use serde_json::json;
//!
//! let config = FactoryConfig::from_yaml(r#"
//! default: format
//! matchers:
//!   - engine: html
//!     suffixes: [".page"]
//! "#).unwrap();
//!
//! let factory = Factory::from_config("site", &config);
//! let page = factory.from_named("index.page", "<h1>{{ title }}</h1>");
//! assert_eq!(page.render(&json!({"title": "a&b"})).unwrap(), "<h1>a&amp;b</h1>");
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{self, EngineKind, SuffixMatcher};
use crate::error::{RenderError, Result};
use crate::factory::Factory;

/// Engine selection settings for a [`Factory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactoryConfig {
    /// Engine used when no matcher applies.
    #[serde(default)]
    pub default: Option<EngineKind>,

    /// Suffix rules, consulted in order.
    #[serde(default)]
    pub matchers: Vec<MatcherConfig>,

    /// Append the bundled suffix matchers after the configured ones.
    #[serde(default)]
    pub stdlib: bool,
}

/// Maps file suffixes to a bundled engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatcherConfig {
    pub engine: EngineKind,
    pub suffixes: Vec<String>,
}

impl FactoryConfig {
    /// Parses and validates a YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: FactoryConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|err| RenderError::read(path, err))?;
        Self::from_yaml(&yaml)
    }

    /// Rejects matchers that could never match.
    pub fn validate(&self) -> Result<()> {
        for (i, matcher) in self.matchers.iter().enumerate() {
            if matcher.suffixes.is_empty() {
                return Err(RenderError::Config(format!(
                    "matcher {} ({}) has no suffixes",
                    i, matcher.engine
                )));
            }
            if matcher.suffixes.iter().any(|s| s.is_empty()) {
                return Err(RenderError::Config(format!(
                    "matcher {} ({}) has an empty suffix",
                    i, matcher.engine
                )));
            }
        }
        Ok(())
    }
}

impl Factory {
    /// Builds a factory from configuration.
    pub fn from_config(name: impl Into<String>, config: &FactoryConfig) -> Self {
        let mut factory = Factory::new(name);

        if let Some(kind) = config.default {
            factory = factory.default_parser_arc(kind.parser());
        }

        for matcher in &config.matchers {
            factory = factory.add_matcher(SuffixMatcher::new(
                matcher.suffixes.iter().cloned(),
                matcher.engine.parser(),
            ));
        }

        if config.stdlib {
            factory = factory.add_matchers(engine::stdlib_matchers());
        }

        tracing::debug!(
            factory = factory.name(),
            matchers = factory.matcher_count(),
            default = ?config.default,
            "factory configured"
        );
        factory
    }
}
