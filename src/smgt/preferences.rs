//! Preference list construction for one DAG level.

use std::collections::BTreeMap;

use crate::metrics::et;
use crate::model::dag::Dag;
use crate::model::vm::Vm;
use crate::schedule::Ranks;

/// Task-over-VM preferences: task `t` prefers VM `k` over `k'` iff `ET(t,k) <
/// ET(t,k')`, tie-broken by lower VM id. Returns, for each task in
/// `level_tasks`, its full VM preference list (most preferred first).
pub fn task_preferences(level_tasks: &[usize], dag: &Dag, vms: &[Vm]) -> BTreeMap<usize, Vec<usize>> {
    level_tasks
        .iter()
        .map(|&t| {
            let size = dag.get_task(t).map(|task| task.size).unwrap_or(0.0);
            let mut ordered: Vec<usize> = vms.iter().map(|vm| vm.id).collect();
            ordered.sort_by(|&a, &b| {
                let vm_a = vms.iter().find(|v| v.id == a).unwrap();
                let vm_b = vms.iter().find(|v| v.id == b).unwrap();
                et(size, vm_a)
                    .total_cmp(&et(size, vm_b))
                    .then(a.cmp(&b))
            });
            (t, ordered)
        })
        .collect()
}

/// VM-over-task preference, shared by every VM in this level since it does not
/// depend on the VM: task `t` is preferred over `t'` iff `t` has greater
/// downward rank, tie-broken by lower task id. Returns each task's position in
/// that order (0 = most preferred) for use as a sort key during matching.
pub fn vm_rank_position(level_tasks: &[usize], ranks: &BTreeMap<usize, Ranks>) -> BTreeMap<usize, usize> {
    let mut ordered: Vec<usize> = level_tasks.to_vec();
    ordered.sort_by(|&a, &b| {
        let rank_a = ranks.get(&a).map(|r| r.downward).unwrap_or(0.0);
        let rank_b = ranks.get(&b).map(|r| r.downward).unwrap_or(0.0);
        rank_b.total_cmp(&rank_a).then(a.cmp(&b))
    });
    ordered.into_iter().enumerate().map(|(pos, t)| (t, pos)).collect()
}
