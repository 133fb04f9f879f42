//! Workflow task.

use std::collections::BTreeMap;

/// A node in the workflow DAG.
///
/// Tasks are plain data: no mutable state, no references to sibling tasks.
/// Edges are expressed purely as id lists (`pred`/`succ`), the same id-and-side-table
/// discipline the pipeline uses for VM assignment — it avoids the cyclic object
/// graphs a direct task-to-task reference would require.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: usize,
    /// Computational size, in whatever unit `Vm::processing_capacity` is denominated in.
    pub size: f64,
    pub pred: Vec<usize>,
    pub succ: Vec<usize>,
    /// Optional informational per-successor communication weight. The scheduler's
    /// actual transmission costs come from the communication-cost table built by
    /// the pipeline from `size` and the run's CCR; this map is carried for input
    /// fidelity but is not consulted by `metrics::t_trans`.
    pub edge_weights: BTreeMap<usize, f64>,
}

impl Task {
    pub fn new(id: usize, size: f64) -> Self {
        Self {
            id,
            size,
            pred: Vec::new(),
            succ: Vec::new(),
            edge_weights: BTreeMap::new(),
        }
    }

    pub fn with_edges(mut self, pred: Vec<usize>, succ: Vec<usize>) -> Self {
        self.pred = pred;
        self.succ = succ;
        self
    }

    pub fn is_entry(&self) -> bool {
        self.pred.is_empty()
    }

    pub fn is_exit(&self) -> bool {
        self.succ.is_empty()
    }
}
