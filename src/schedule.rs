//! The pipeline's output value object.
//!
//! Each phase produces its own immutable result and the next phase clones and
//! extends it rather than mutating shared state in place. `Schedule` is
//! assembled once by [`crate::pipeline::schedule`] and is immutable from then
//! on: there is no `&mut Schedule` anywhere in this crate's public API.

use std::collections::BTreeMap;

/// A duplicate execution instance of a task, placed on a VM that was not its
/// original assignment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Duplicate {
    pub ast: f64,
    pub aft: f64,
}

#[derive(Clone, Debug)]
pub struct Ranks {
    pub downward: f64,
    pub upward: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Schedule {
    /// VM id -> ordered task ids (execution order on that VM).
    pub vm_schedule: BTreeMap<usize, Vec<usize>>,
    /// Task id -> assigned VM id (one entry per task; duplicates live in `duplicates`).
    pub task_to_vm: BTreeMap<usize, usize>,
    pub task_ast: BTreeMap<usize, f64>,
    pub task_aft: BTreeMap<usize, f64>,
    /// (task id, host VM id) -> duplicate timing. A duplicate never replaces the original.
    pub duplicates: BTreeMap<(usize, usize), Duplicate>,
    pub critical_path: std::collections::BTreeSet<usize>,
    pub levels: BTreeMap<usize, Vec<usize>>,
    pub ranks: BTreeMap<usize, Ranks>,
}

impl Schedule {
    pub fn vm_for(&self, task: usize) -> Option<usize> {
        self.task_to_vm.get(&task).copied()
    }

    /// True if `host` already holds a duplicate of `task`.
    pub fn has_duplicate(&self, task: usize, host: usize) -> bool {
        self.duplicates.contains_key(&(task, host))
    }

    /// AFT to use for `task` as observed from VM `on_vm`: the duplicate's AFT
    /// if one lives on `on_vm`, otherwise the original's AFT (I3).
    pub fn effective_aft(&self, task: usize, on_vm: usize) -> Option<f64> {
        if let Some(dup) = self.duplicates.get(&(task, on_vm)) {
            Some(dup.aft)
        } else {
            self.task_aft.get(&task).copied()
        }
    }
}
