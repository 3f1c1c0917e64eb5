//! Bounded fixpoint iteration (§4.7 "Fixpoint evaluation", invariant I2).
//!
//! This module only owns the iterate-and-count-changes loop; the actual
//! work of evaluating a node and deciding whether its value changed
//! (canonical-JSON comparison, absent ⇒ changed) belongs to the caller,
//! since that requires the interpreter and query engine this crate does
//! not depend on.

/// `spec.md` §4.7: "Iterate at most 10 times."
pub const MAX_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixpointOutcome {
    /// No node changed during the last iteration; `iterations` counts how
    /// many full passes ran, including the settling one.
    Converged { iterations: usize },
    /// The layer was still changing after [`MAX_ITERATIONS`] passes.
    LimitReached,
}

/// Drives `evaluate_once` over `node_indices` until a pass produces no
/// changes or [`MAX_ITERATIONS`] is reached. `evaluate_once(i)` should
/// evaluate node `i`, store its result, and return whether the stored
/// value changed.
pub fn run<F>(node_indices: &[usize], mut evaluate_once: F) -> FixpointOutcome
where
    F: FnMut(usize) -> bool,
{
    if node_indices.is_empty() {
        return FixpointOutcome::Converged { iterations: 0 };
    }

    for iteration in 1..=MAX_ITERATIONS {
        let mut changed = false;
        for &index in node_indices {
            if evaluate_once(index) {
                changed = true;
            }
        }
        if !changed {
            return FixpointOutcome::Converged { iterations: iteration };
        }
    }
    FixpointOutcome::LimitReached
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layer_converges_immediately() {
        assert_eq!(run(&[], |_| true), FixpointOutcome::Converged { iterations: 0 });
    }

    #[test]
    fn settles_once_a_pass_reports_no_changes() {
        let mut calls = 0;
        let outcome = run(&[0, 1], |_| {
            calls += 1;
            calls <= 2 // first pass over both nodes reports changed, second does not
        });
        assert_eq!(outcome, FixpointOutcome::Converged { iterations: 2 });
    }

    #[test]
    fn never_settling_hits_the_limit() {
        let outcome = run(&[0, 1], |_| true);
        assert_eq!(outcome, FixpointOutcome::LimitReached);
    }
}
