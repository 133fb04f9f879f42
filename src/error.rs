//! Error taxonomy for the scheduling core.

use thiserror::Error;

/// Errors surfaced by the [`schedule`](crate::pipeline::schedule) entry point.
///
/// DCP and SMGT failures are fatal and propagate here; LOTD never returns an
/// error (see [`crate::lotd`]) since a failed duplication is simply skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    /// The DAG has a cycle, lacks an entry task, or lacks an exit task.
    #[error("malformed graph: {reason}")]
    MalformedGraph { reason: String },

    /// A task id referenced by an edge or a schedule lookup does not exist.
    #[error("unknown task id {0}")]
    UnknownTask(usize),

    /// A VM id referenced by a bandwidth entry or a schedule lookup does not exist.
    #[error("unknown VM id {0}")]
    UnknownVM(usize),

    /// SMGT quotas for some level do not cover that level's task population.
    #[error("insufficient quota at level {level}: need {needed}, have {available}")]
    InsufficientQuota {
        level: usize,
        needed: usize,
        available: usize,
    },

    /// An intermediate rank or timing value exceeded the representable range.
    #[error("numeric overflow while computing {context}")]
    NumericOverflow { context: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
