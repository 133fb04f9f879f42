//! Communication-cost table.
//!
//! Built once per `schedule()` call from the DAG and CCR, consulted by DCP (for
//! ranking) and LOTD (for arrival-time estimates). `metrics::t_trans` scales a
//! table entry by the ratio of reference to actual bandwidth between two VMs.

use std::collections::BTreeMap;

use crate::model::dag::Dag;
use crate::model::vm::Vm;

#[derive(Clone, Debug)]
pub struct CommCostTable {
    costs: BTreeMap<(usize, usize), f64>,
    /// Mean of all finite pairwise bandwidths across the VM fleet (`B̄`).
    pub reference_bandwidth: f64,
}

impl CommCostTable {
    /// `cost(i,j) = size(i) * ccr / B̄` for every edge `(i,j)` in the DAG.
    pub fn build(dag: &Dag, vms: &[Vm], ccr: f64) -> Self {
        let reference_bandwidth = mean_bandwidth(vms);
        let mut costs = BTreeMap::new();
        for task in dag.tasks() {
            for &succ in &task.succ {
                let cost = if reference_bandwidth > 0.0 {
                    task.size * ccr / reference_bandwidth
                } else {
                    f64::INFINITY
                };
                costs.insert((task.id, succ), cost);
            }
        }
        Self {
            costs,
            reference_bandwidth,
        }
    }

    /// The edge cost at reference bandwidth, or 0 if `(src, dst)` is not an edge
    /// (callers only query actual DAG edges, but this keeps lookups total).
    pub fn cost(&self, src: usize, dst: usize) -> f64 {
        self.costs.get(&(src, dst)).copied().unwrap_or(0.0)
    }

    /// The reference-bandwidth cost of any edge leaving `task`. By construction
    /// every outgoing edge of a task carries the same cost (it depends only on
    /// the source task's size, the run's CCR, and `B̄`), so LOTD's arrival-time
    /// estimate can use this instead of naming a specific successor.
    pub fn outgoing_cost(&self, task: usize) -> Option<f64> {
        self.costs.range((task, usize::MIN)..(task + 1, usize::MIN)).next().map(|(_, &c)| c)
    }
}

/// Mean of all finite pairwise (distinct-VM) bandwidths, the `B̄` reference rate.
fn mean_bandwidth(vms: &[Vm]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for a in vms {
        for b in vms {
            if a.id == b.id {
                continue;
            }
            let bw = a.bandwidth_to(b.id);
            if bw.is_finite() && bw > 0.0 {
                sum += bw;
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
