//! Pre-schedule emission: per-VM ordering and AST/AFT timing.

use std::collections::BTreeMap;

use crate::dcp::DcpResult;
use crate::error::Result;
use crate::metrics::{et, t_trans};
use crate::model::comm::CommCostTable;
use crate::model::dag::Dag;
use crate::model::vm::Vm;
use crate::schedule::Schedule;

/// Orders tasks ascending by level, then descending by downward rank within a
/// level (ties broken by ascending task id) — a single, fixed global order
/// this crate documents and holds to throughout. This single global order,
/// filtered per VM, is exactly the per-VM ordering the pre-schedule needs, and
/// processing it in sequence also respects data dependencies: a task's level
/// is strictly greater than every predecessor's level, so no task is timed
/// before its predecessors.
fn global_processing_order(dag: &Dag, dcp: &DcpResult) -> Vec<usize> {
    let mut order: Vec<usize> = dag.tasks().iter().map(|t| t.id).collect();
    order.sort_by(|&a, &b| {
        let level_a = dcp.level_of.get(&a).copied().unwrap_or(0);
        let level_b = dcp.level_of.get(&b).copied().unwrap_or(0);
        let rank_a = dcp.ranks.get(&a).map(|r| r.downward).unwrap_or(0.0);
        let rank_b = dcp.ranks.get(&b).map(|r| r.downward).unwrap_or(0.0);
        level_a
            .cmp(&level_b)
            .then(rank_b.total_cmp(&rank_a))
            .then(a.cmp(&b))
    });
    order
}

/// Builds the pre-schedule from a full task -> VM assignment produced by
/// per-level stable matching (`smgt::run`).
pub fn build(
    dag: &Dag,
    vms: &[Vm],
    costs: &CommCostTable,
    dcp: &DcpResult,
    assignment: &BTreeMap<usize, usize>,
) -> Result<Schedule> {
    let order = global_processing_order(dag, dcp);
    let mut vm_free_at: BTreeMap<usize, f64> = vms.iter().map(|vm| (vm.id, 0.0)).collect();
    let mut vm_schedule: BTreeMap<usize, Vec<usize>> = vms.iter().map(|vm| (vm.id, Vec::new())).collect();
    let mut task_ast = BTreeMap::new();
    let mut task_aft = BTreeMap::new();

    for &t in &order {
        let task = dag.get_task(t)?;
        let vm_id = assignment[&t];
        let vm = vms.iter().find(|v| v.id == vm_id).unwrap();

        let dependency_ready = task
            .pred
            .iter()
            .map(|&p| {
                let pred_vm_id = assignment[&p];
                let pred_vm = vms.iter().find(|v| v.id == pred_vm_id).unwrap();
                let arrival = t_trans(costs.cost(p, t), costs.reference_bandwidth, pred_vm, vm);
                task_aft[&p] + arrival
            })
            .fold(0.0_f64, f64::max);

        let ast = dependency_ready.max(vm_free_at[&vm_id]);
        let aft = ast + et(task.size, vm);

        task_ast.insert(t, ast);
        task_aft.insert(t, aft);
        vm_free_at.insert(vm_id, aft);
        vm_schedule.get_mut(&vm_id).unwrap().push(t);
    }

    Ok(Schedule {
        vm_schedule,
        task_to_vm: assignment.clone(),
        task_ast,
        task_aft,
        duplicates: BTreeMap::new(),
        critical_path: dcp.critical_path.clone(),
        levels: dcp.levels.clone(),
        ranks: dcp.ranks.clone(),
    })
}
