//! LOTD — List Of Task Duplication.
//!
//! Consumes the SMGT pre-schedule and opportunistically duplicates predecessor
//! tasks onto VMs hosting their successors, filling idle gaps to shave waiting
//! time off the critical path. Never fails: every impossible placement is a
//! silent, debug-logged skip.

pub mod idle_slots;

use std::collections::{BTreeSet, VecDeque};

use log::{debug, error};

use crate::config::SchedulerConfig;
use crate::metrics::{et, t_trans};
use crate::model::comm::CommCostTable;
use crate::model::dag::Dag;
use crate::model::vm::Vm;
use crate::schedule::{Duplicate, Schedule};

/// Runs LOTD over a pre-schedule produced by SMGT, returning the final schedule.
pub fn run(dag: &Dag, vms: &[Vm], costs: &CommCostTable, pre_schedule: Schedule, config: &SchedulerConfig) -> Schedule {
    let mut schedule = pre_schedule;
    let candidates = candidate_tasks(dag, &schedule, config);

    for candidate in candidates {
        try_duplicate(candidate, dag, vms, costs, &mut schedule, config);
    }

    schedule
}

/// Tasks with at least one successor whose level is within the configured
/// boundary (default: level <= 1), in ascending id order for determinism.
fn candidate_tasks(dag: &Dag, schedule: &Schedule, config: &SchedulerConfig) -> Vec<usize> {
    let level_of: std::collections::BTreeMap<usize, usize> = schedule
        .levels
        .iter()
        .flat_map(|(&level, tasks)| tasks.iter().map(move |&t| (t, level)))
        .collect();

    dag.tasks()
        .iter()
        .filter(|t| !t.succ.is_empty())
        .filter(|t| match config.lotd_candidate_max_level {
            Some(max_level) => level_of.get(&t.id).map_or(false, |&level| level <= max_level),
            None => true,
        })
        .map(|t| t.id)
        .collect()
}

fn try_duplicate(
    task_id: usize,
    dag: &Dag,
    vms: &[Vm],
    costs: &CommCostTable,
    schedule: &mut Schedule,
    config: &SchedulerConfig,
) {
    let Some(original_vm) = schedule.vm_for(task_id) else {
        return;
    };
    let Ok(task) = dag.get_task(task_id) else {
        return;
    };

    // BTreeSet gives the deterministic ascending-VM-id scan order this needs.
    let hosts: BTreeSet<usize> = task
        .succ
        .iter()
        .filter_map(|&s| schedule.vm_for(s))
        .filter(|&host| host != original_vm && !schedule.has_duplicate(task_id, host))
        .collect();

    let Some(aft) = schedule.task_aft.get(&task_id).copied() else {
        return;
    };
    let Some(outgoing_cost) = costs.outgoing_cost(task_id) else {
        return;
    };
    let vm_by_id = |id: usize| vms.iter().find(|v| v.id == id);
    let Some(original) = vm_by_id(original_vm) else {
        return;
    };

    for host_id in hosts {
        let Some(host) = vm_by_id(host_id) else { continue };

        let exec = et(task.size, host);
        let arrival = aft + t_trans(outgoing_cost, costs.reference_bandwidth, original, host);
        if !exec.is_finite() || !arrival.is_finite() {
            continue;
        }

        let busy = busy_intervals(host_id, schedule);
        let slots = idle_slots::idle_slots(&busy);

        let accepted = slots
            .into_iter()
            .find(|&(s, e)| e - s >= exec && s + exec < arrival);

        let Some((start, _)) = accepted else {
            debug!(
                "LOTD: no acceptable idle slot for duplicating task {} on VM {} (arrival {:.6})",
                task_id, host_id, arrival
            );
            continue;
        };

        if idle_slots::overlaps(&busy, start, start + exec, config.epsilon) {
            debug!("LOTD: safety re-check rejected duplicate of task {} on VM {}", task_id, host_id);
            continue;
        }

        schedule.duplicates.insert(
            (task_id, host_id),
            Duplicate {
                ast: start,
                aft: start + exec,
            },
        );
        debug!(
            "LOTD: duplicated task {} onto VM {} at [{:.6}, {:.6})",
            task_id, host_id, start, start + exec
        );

        propagate(task_id, host_id, dag, vms, costs, schedule, config);
    }
}

fn busy_intervals(vm_id: usize, schedule: &Schedule) -> Vec<(f64, f64)> {
    let mut intervals: Vec<(f64, f64)> = schedule
        .vm_schedule
        .get(&vm_id)
        .into_iter()
        .flatten()
        .filter_map(|t| Some((*schedule.task_ast.get(t)?, *schedule.task_aft.get(t)?)))
        .collect();
    intervals.extend(
        schedule
            .duplicates
            .iter()
            .filter(|((_, host), _)| *host == vm_id)
            .map(|(_, d)| (d.ast, d.aft)),
    );
    intervals
}

/// Recomputes AST/AFT for every task whose timing can change because of the
/// new duplicate, bounded by `|tasks|^2 * propagation_iteration_multiplier`
/// rounds. Exceeding the bound is logged as a bug rather than treated as a
/// normal outcome, since a correct propagation always converges well inside it.
///
/// Propagation follows two edges, not just the DAG successor edges: a task's
/// AST is also floored by the finish time of whichever task runs immediately
/// before it on the same VM (the pre-schedule's per-VM order), so that edge
/// must be re-walked too, or an accepted duplicate could pull a later task's
/// start time earlier than the VM's non-overlap guarantee allows.
fn propagate(
    duplicated_task: usize,
    host: usize,
    dag: &Dag,
    vms: &[Vm],
    costs: &CommCostTable,
    schedule: &mut Schedule,
    config: &SchedulerConfig,
) {
    let directly_affected: Vec<usize> = dag
        .get_task(duplicated_task)
        .map(|t| t.succ.iter().copied().filter(|&s| schedule.vm_for(s) == Some(host)).collect())
        .unwrap_or_default();

    let mut queue: VecDeque<usize> = directly_affected.into_iter().collect();
    let mut queued: BTreeSet<usize> = queue.iter().copied().collect();

    let limit = dag.len().saturating_mul(dag.len()).max(1) * config.propagation_iteration_multiplier.max(1);
    let mut rounds = 0usize;

    while let Some(u) = queue.pop_front() {
        queued.remove(&u);
        rounds += 1;
        if rounds > limit {
            error!(
                "LOTD timing propagation exceeded {} rounds while duplicating task {} on VM {}; stopping (bug)",
                limit, duplicated_task, host
            );
            return;
        }

        let Some((new_ast, new_aft)) = recompute_timing(u, dag, vms, costs, schedule) else {
            continue;
        };
        let old_aft = schedule.task_aft.get(&u).copied().unwrap_or(f64::MIN);
        if (new_aft - old_aft).abs() <= config.epsilon {
            continue;
        }
        schedule.task_ast.insert(u, new_ast);
        schedule.task_aft.insert(u, new_aft);

        let Some(vm_id) = schedule.vm_for(u) else { continue };
        let mut next_hops: Vec<usize> = dag.get_task(u).map(|t| t.succ.clone()).unwrap_or_default();
        if let Some(next_on_vm) = next_in_vm_order(u, vm_id, schedule) {
            next_hops.push(next_on_vm);
        }
        for hop in next_hops {
            if queued.insert(hop) {
                queue.push_back(hop);
            }
        }
    }
}

/// `ST`/`FT` for `u` recomputed with the duplicate-aware predecessor rule
/// (I3: a predecessor's effective AFT is its duplicate's AFT, with zero
/// transmission cost, when that duplicate lives on `u`'s VM), floored by the
/// finish time of the task immediately preceding `u` in its VM's fixed order.
fn recompute_timing(u: usize, dag: &Dag, vms: &[Vm], costs: &CommCostTable, schedule: &Schedule) -> Option<(f64, f64)> {
    let vm_id = schedule.vm_for(u)?;
    let vm = vms.iter().find(|v| v.id == vm_id)?;
    let task = dag.get_task(u).ok()?;

    let dependency_ready = task
        .pred
        .iter()
        .map(|&p| {
            let base_aft = schedule.effective_aft(p, vm_id).unwrap_or(0.0);
            if schedule.has_duplicate(p, vm_id) {
                base_aft
            } else {
                let pred_vm_id = schedule.vm_for(p).unwrap_or(vm_id);
                let pred_vm = vms.iter().find(|v| v.id == pred_vm_id).unwrap_or(vm);
                base_aft + t_trans(costs.outgoing_cost(p).unwrap_or(0.0), costs.reference_bandwidth, pred_vm, vm)
            }
        })
        .fold(0.0_f64, f64::max);

    let vm_floor = prev_in_vm_order(u, vm_id, schedule)
        .and_then(|prev| schedule.task_aft.get(&prev).copied())
        .unwrap_or(0.0);

    let ast = dependency_ready.max(vm_floor);
    Some((ast, ast + et(task.size, vm)))
}

fn prev_in_vm_order(task: usize, vm_id: usize, schedule: &Schedule) -> Option<usize> {
    let order = schedule.vm_schedule.get(&vm_id)?;
    let idx = order.iter().position(|&t| t == task)?;
    if idx == 0 {
        None
    } else {
        Some(order[idx - 1])
    }
}

fn next_in_vm_order(task: usize, vm_id: usize, schedule: &Schedule) -> Option<usize> {
    let order = schedule.vm_schedule.get(&vm_id)?;
    let idx = order.iter().position(|&t| t == task)?;
    order.get(idx + 1).copied()
}
