//! Evaluation-local configuration (§3.3).

use std::time::Duration;

/// Tunables for one [`crate::evaluate`] call. Nothing here enters the
/// signable payload — see `EvalOutcome::signable_payload` — so two calls
/// that differ only by `EvalOptions` still sign identically.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Decimal places plain (non-quantity) `Decimal` properties are
    /// rounded to in the value map handed back to the host (§6). The
    /// bit-exact 5-decimal-place truncation rule for quantity triples
    /// (§6, §8 scenario 4) is fixed in `ldc-expr` and does not go through
    /// this knob.
    pub decimal_precision: u32,
    /// Upper bound on fixpoint passes. Never raised above the scheduler's
    /// own ceiling (§4.7 "iterate at most 10 times"); a lower value here
    /// trims it further.
    pub max_fixpoint_iterations: usize,
    /// How many scheduler layers (and fixpoint iterations) run between
    /// checks of the host's cancellation closure and timeout.
    pub cancellation_poll_granularity: usize,
    /// Wall-clock budget for one evaluation, checked at the same poll
    /// points as cancellation. Never reaches the signed payload.
    pub timeout: Option<Duration>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            decimal_precision: 10,
            max_fixpoint_iterations: ldc_schedule::MAX_ITERATIONS,
            cancellation_poll_granularity: 1,
            timeout: None,
        }
    }
}
