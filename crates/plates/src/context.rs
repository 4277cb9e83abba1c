//! Render contexts and the abort contract.
//!
//! Every render call receives a [`Context`]: the data exposed to the template
//! body, plus two optional capabilities used for cooperative aborts.
//!
//! - [`Context::aborted`] reports an abort failure, if any. A [`Template`] polls
//!   it once, after the engine has finished executing. A reported abort wins
//!   over both a successful and a failed execution.
//! - [`Context::abort_signal`] hands engines an [`AbortSignal`] they expose to
//!   template logic as an `abort()` function. The template, not the renderer,
//!   decides when to call it.
//!
//! ```rust
//! use plates::{Abortable, Factory};
//! use serde_json::json;
//!
//! let template = Factory::new("report")
//!     .default_parser(plates::engine::text_parser)
//!     .from_source("{% if items | length == 0 %}{{ abort('nothing to report') }}{% endif %}");
//!
//! let ctx = Abortable::new(json!({ "items": [] }));
//! let err = template.render(&ctx).unwrap_err();
//! assert!(err.is_aborted());
//! assert_eq!(err.to_string(), "nothing to report");
//! ```
//!
//! [`Template`]: crate::Template

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

use crate::error::{RenderError, Result};

/// Reason recorded when template logic aborts without giving one.
pub const DEFAULT_ABORT_REASON: &str = "aborted";

/// Data passed to a single render call.
pub trait Context {
    /// The data exposed to the template body.
    ///
    /// Fails with [`RenderError::Serialize`] when the data cannot be
    /// represented as JSON.
    fn to_value(&self) -> Result<Value>;

    /// Reports an abort failure, if template logic requested one.
    fn aborted(&self) -> Option<RenderError> {
        None
    }

    /// The signal engines bind to the template-visible `abort()` function.
    fn abort_signal(&self) -> Option<AbortSignal> {
        None
    }
}

impl Context for Value {
    fn to_value(&self) -> Result<Value> {
        Ok(self.clone())
    }
}

impl Context for () {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::Null)
    }
}

impl<C: Context + ?Sized> Context for &C {
    fn to_value(&self) -> Result<Value> {
        (**self).to_value()
    }

    fn aborted(&self) -> Option<RenderError> {
        (**self).aborted()
    }

    fn abort_signal(&self) -> Option<AbortSignal> {
        (**self).abort_signal()
    }
}

/// Adapts any serializable value into a [`Context`].
///
/// A value that fails to serialize fails the render.
#[derive(Debug, Clone)]
pub struct Data<T>(pub T);

impl<T: Serialize> Context for Data<T> {
    fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.0)?)
    }
}

/// Shared abort flag.
///
/// Clones share state: template logic marks the signal through an engine
/// provided function, and the renderer later observes it through
/// [`Context::aborted`].
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    reason: Arc<Mutex<Option<String>>>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the signal as aborted. The first reason recorded is kept.
    pub fn abort(&self, reason: impl Into<String>) {
        let mut slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(reason.into());
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.reason().is_some()
    }

    pub fn reason(&self) -> Option<String> {
        self.reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clears a recorded abort so the signal can be reused.
    pub fn reset(&self) {
        *self.reason.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The failure a renderer returns for this signal, if aborted.
    pub fn to_error(&self) -> Option<RenderError> {
        self.reason().map(RenderError::Aborted)
    }
}

/// A context carrying data plus an [`AbortSignal`].
///
/// Template logic can call `abort()` (or `abort("reason")`) while rendering;
/// the render call then fails with [`RenderError::Aborted`] and no output
/// file is written.
#[derive(Debug, Clone)]
pub struct Abortable<T> {
    data: T,
    signal: AbortSignal,
}

impl<T> Abortable<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            signal: AbortSignal::new(),
        }
    }

    /// Uses an existing signal, e.g. one shared with the caller.
    pub fn with_signal(data: T, signal: AbortSignal) -> Self {
        Self { data, signal }
    }

    pub fn signal(&self) -> &AbortSignal {
        &self.signal
    }

    pub fn data(&self) -> &T {
        &self.data
    }
}

impl<T: Serialize> Context for Abortable<T> {
    fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.data)?)
    }

    fn aborted(&self) -> Option<RenderError> {
        self.signal.to_error()
    }

    fn abort_signal(&self) -> Option<AbortSignal> {
        Some(self.signal.clone())
    }
}
