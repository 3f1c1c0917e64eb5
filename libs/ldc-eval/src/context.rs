//! The host-to-core contract (§6): capabilities, clock, units and the
//! document loader one evaluation runs under.

use chrono::{DateTime, Utc};
use ldc_compose::DocumentLoader;
use ldc_units::UnitRegistry;

use crate::error::{EvalError, Result};

/// One evaluation's capability/clock/loader context. Borrowed for the
/// duration of a single [`crate::evaluate`] call (§5: "single-threaded
/// and cooperative ... within one document").
pub struct EvalContext<'a> {
    pub(crate) units: UnitRegistry,
    pub(crate) caps: Vec<String>,
    #[allow(dead_code)]
    pub(crate) now: Option<DateTime<Utc>>,
    pub(crate) loader: Option<&'a dyn DocumentLoader>,
    pub(crate) should_abort: Option<&'a dyn Fn() -> bool>,
}

impl<'a> EvalContext<'a> {
    /// Builds a context with a default (`with_defaults`) unit registry and
    /// no loader/clock/cancellation hook. Fails only on malformed input —
    /// a blank capability string can never be a legitimate scope name.
    pub fn new(caps: Vec<String>) -> Result<Self> {
        if let Some(blank) = caps.iter().find(|c| c.trim().is_empty()) {
            return Err(EvalError::BlankCapability(blank.clone()));
        }
        Ok(EvalContext {
            units: UnitRegistry::with_defaults(),
            caps,
            now: None,
            loader: None,
            should_abort: None,
        })
    }

    pub fn with_units(mut self, units: UnitRegistry) -> Self {
        self.units = units;
        self
    }

    /// Records the host's wall clock for bookkeeping (§6's `now` contract
    /// field). `$now()`/`$today()`/`$timestamp()` (§4.5) read the real
    /// clock directly rather than consulting this value, so it does not
    /// make those built-ins deterministic by itself — only the canonical
    /// payload's exclusion of non-deterministic fields keeps signatures
    /// stable across calls.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_loader(mut self, loader: &'a dyn DocumentLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Registers the cooperative cancellation poll (§5): a closure the
    /// façade checks between scheduler layers and fixpoint iterations,
    /// never mid-expression.
    pub fn with_cancellation(mut self, should_abort: &'a dyn Fn() -> bool) -> Self {
        self.should_abort = Some(should_abort);
        self
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.caps.iter().any(|c| c == name)
    }
}
