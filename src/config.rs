//! Knobs left to the caller, gathered into one value object.
//!
//! No environment variables, no CLI: the core has no such surface. Callers
//! construct a [`SchedulerConfig`] in-process and pass it to
//! [`crate::pipeline::schedule`].

/// Tolerance used for interval-overlap checks (I4) and critical-path membership (§4.2).
pub const EPSILON: f64 = 1e-6;

/// Tolerance used for invariant tests against exact formulas (P1, §8).
pub const INVARIANT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Upper bound (inclusive) on the DCP level of a task for it to be considered
    /// an LOTD duplication candidate. `Some(1)` considers all tasks with
    /// successors whose level is at most 1 past the DAG root. `None` widens
    /// the candidate set to all tasks with at least one successor.
    pub lotd_candidate_max_level: Option<usize>,

    /// Tolerance for interval overlap and critical-path membership checks.
    pub epsilon: f64,

    /// Bound on fixed-point timing propagation rounds during LOTD, expressed as
    /// a multiplier on `|tasks|^2`. Exceeding it is logged as a bug rather than
    /// treated as a schedulable failure, since a correct propagation always
    /// converges well inside this bound.
    pub propagation_iteration_multiplier: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lotd_candidate_max_level: Some(1),
            epsilon: EPSILON,
            propagation_iteration_multiplier: 1,
        }
    }
}
