//! DCP — Dynamic Critical Path ranking.
//!
//! Computes the level partition, the downward/upward rank of every task, and
//! the critical-path task set. A single forward longest-path rank (successors
//! only) is enough to order proposals for a priority-list heuristic; locating
//! the critical path needs both directions, so this computes the downward
//! rank (from entries) and the upward rank (to exits) in separate passes.

use std::collections::BTreeMap;

use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError};
use crate::metrics::avg_et;
use crate::model::comm::CommCostTable;
use crate::model::dag::Dag;
use crate::model::vm::Vm;
use crate::schedule::Ranks;

#[derive(Clone, Debug)]
pub struct DcpResult {
    pub levels: BTreeMap<usize, Vec<usize>>,
    pub level_of: BTreeMap<usize, usize>,
    pub ranks: BTreeMap<usize, Ranks>,
    pub critical_path: std::collections::BTreeSet<usize>,
    pub critical_path_length: f64,
}

/// Runs DCP over `dag`. Fails with `MalformedGraph` if `dag` has no entry or
/// exit tasks — defensive, since `Dag::new` already enforces this at
/// construction; kept as a second guard at the point of use.
pub fn run(dag: &Dag, vms: &[Vm], costs: &CommCostTable, config: &SchedulerConfig) -> Result<DcpResult> {
    if dag.entry_tasks().is_empty() || dag.exit_tasks().is_empty() {
        return Err(SchedulerError::MalformedGraph {
            reason: "DCP requires at least one entry task and one exit task".to_string(),
        });
    }

    let order = dag.topological_order()?;
    let levels = compute_levels(dag, &order)?;

    let avg_et_by_task: Vec<f64> = dag.tasks().iter().map(|t| avg_et(t.size, vms)).collect();

    let downward = compute_downward(dag, &order, &avg_et_by_task, costs)?;
    let upward = compute_upward(dag, &order, &avg_et_by_task, costs)?;

    let mut scores = vec![0.0; dag.len()];
    let mut length = f64::MIN;
    for task in dag.tasks() {
        let score = downward[task.id] + upward[task.id] - avg_et_by_task[task.id];
        scores[task.id] = score;
        length = length.max(score);
    }
    if !length.is_finite() {
        return Err(SchedulerError::NumericOverflow {
            context: "critical path length".to_string(),
        });
    }

    let critical_path = scores
        .iter()
        .enumerate()
        .filter(|&(_, &score)| (score - length).abs() <= config.epsilon)
        .map(|(id, _)| id)
        .collect();

    let ranks = dag
        .tasks()
        .iter()
        .map(|t| {
            (
                t.id,
                Ranks {
                    downward: downward[t.id],
                    upward: upward[t.id],
                },
            )
        })
        .collect();

    let mut level_of = BTreeMap::new();
    for (&level, tasks) in &levels {
        for &t in tasks {
            level_of.insert(t, level);
        }
    }

    Ok(DcpResult {
        levels,
        level_of,
        ranks,
        critical_path,
        critical_path_length: length,
    })
}

/// `level(entry) = 0`; `level(t) = 1 + max(level(p) for p in pre(t))`.
fn compute_levels(dag: &Dag, order: &[usize]) -> Result<BTreeMap<usize, Vec<usize>>> {
    let mut level = vec![0usize; dag.len()];
    for &t in order {
        let task = dag.get_task(t)?;
        if !task.pred.is_empty() {
            level[t] = task.pred.iter().map(|&p| level[p] + 1).max().unwrap_or(0);
        }
    }
    let mut levels: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &t in order {
        levels.entry(level[t]).or_default().push(t);
    }
    for tasks in levels.values_mut() {
        tasks.sort_unstable();
    }
    Ok(levels)
}

/// `d(t) = avgET(t) + max over p in pre(t) of (d(p) + cost(p,t))`, processed in
/// topological order so every predecessor's rank is final before it is read.
fn compute_downward(dag: &Dag, order: &[usize], avg_et_by_task: &[f64], costs: &CommCostTable) -> Result<Vec<f64>> {
    let mut d = vec![0.0; dag.len()];
    for &t in order {
        let task = dag.get_task(t)?;
        let pred_term = task
            .pred
            .iter()
            .map(|&p| d[p] + costs.cost(p, t))
            .fold(f64::MIN, f64::max);
        d[t] = avg_et_by_task[t] + if task.pred.is_empty() { 0.0 } else { pred_term };
    }
    Ok(d)
}

/// `u(t) = avgET(t) + max over s in succ(t) of (cost(t,s) + u(s))`, processed in
/// reverse topological order so every successor's rank is final before it is read.
fn compute_upward(dag: &Dag, order: &[usize], avg_et_by_task: &[f64], costs: &CommCostTable) -> Result<Vec<f64>> {
    let mut u = vec![0.0; dag.len()];
    for &t in order.iter().rev() {
        let task = dag.get_task(t)?;
        let succ_term = task
            .succ
            .iter()
            .map(|&s| costs.cost(t, s) + u[s])
            .fold(f64::MIN, f64::max);
        u[t] = avg_et_by_task[t] + if task.succ.is_empty() { 0.0 } else { succ_term };
    }
    Ok(u)
}
