//! Pure metric functions over a finished schedule.
//!
//! Every function here is side-effect-free and takes its inputs by reference;
//! they may be called from multiple threads on a frozen [`Schedule`] since
//! nothing here carries interior mutability — `Vm` is a plain value type
//! (see `model::vm`), not a handle to shared mutable state.

use crate::model::dag::Dag;
use crate::model::vm::Vm;
use crate::schedule::Schedule;

/// `ET(t, k) = size(t) / processingCapacity(k)`; `+∞` if capacity ≤ 0.
pub fn et(task_size: f64, vm: &Vm) -> f64 {
    let cap = vm.processing_capacity();
    if cap <= 0.0 {
        f64::INFINITY
    } else {
        task_size / cap
    }
}

/// `Ttrans(i, j, k, l, CCR)` given a precomputed reference-bandwidth cost and
/// the actual bandwidth between the two hosting VMs. `0` when `k == l`.
pub fn t_trans(cost_at_reference: f64, reference_bandwidth: f64, src_vm: &Vm, dst_vm: &Vm) -> f64 {
    if src_vm.id == dst_vm.id {
        return 0.0;
    }
    let bandwidth = src_vm.bandwidth_to(dst_vm.id);
    if bandwidth <= 0.0 {
        return f64::INFINITY;
    }
    cost_at_reference * reference_bandwidth / bandwidth
}

/// `min_k ET(t, k)` over every VM in the fleet.
pub fn min_et(task_size: f64, vms: &[Vm]) -> f64 {
    vms.iter()
        .map(|vm| et(task_size, vm))
        .fold(f64::INFINITY, f64::min)
}

/// `avgET(t) = mean_k ET(t, k)` over every VM in the fleet.
pub fn avg_et(task_size: f64, vms: &[Vm]) -> f64 {
    if vms.is_empty() {
        return 0.0;
    }
    let finite: Vec<f64> = vms.iter().map(|vm| et(task_size, vm)).collect();
    finite.iter().sum::<f64>() / finite.len() as f64
}

/// `MS(k) = max AFT` over tasks assigned to VM `k` (including its duplicates).
pub fn ms(vm_id: usize, schedule: &Schedule) -> f64 {
    let original = schedule
        .vm_schedule
        .get(&vm_id)
        .into_iter()
        .flatten()
        .filter_map(|t| schedule.task_aft.get(t).copied());
    let duplicates = schedule
        .duplicates
        .iter()
        .filter(|((_, host), _)| *host == vm_id)
        .map(|(_, d)| d.aft);
    original.chain(duplicates).fold(f64::MIN, f64::max)
}

/// `makespan = max MS(k)` over all VMs.
pub fn makespan(vms: &[Vm], schedule: &Schedule) -> f64 {
    vms.iter().map(|vm| ms(vm.id, schedule)).fold(0.0, f64::max)
}

/// `SLR = makespan / Σ_{t in critical path} min_k ET(t, k)`; `+∞` if the
/// denominator is 0 or the critical path is empty.
pub fn slr(dag: &Dag, vms: &[Vm], schedule: &Schedule) -> f64 {
    let denom: f64 = schedule
        .critical_path
        .iter()
        .filter_map(|&t| dag.get_task(t).ok())
        .map(|t| min_et(t.size, vms))
        .sum();
    if denom <= 0.0 {
        f64::INFINITY
    } else {
        makespan(vms, schedule) / denom
    }
}

/// `VU(k) = (Σ ET(t, k) over tasks on k) / makespan`.
pub fn vu(vm: &Vm, dag: &Dag, schedule: &Schedule, makespan: f64) -> f64 {
    if makespan <= 0.0 {
        return 0.0;
    }
    let busy: f64 = schedule
        .vm_schedule
        .get(&vm.id)
        .into_iter()
        .flatten()
        .filter_map(|&t| dag.get_task(t).ok())
        .map(|t| et(t.size, vm))
        .sum();
    busy / makespan
}

/// `AVU = mean_k VU(k)`.
pub fn avu(dag: &Dag, vms: &[Vm], schedule: &Schedule) -> f64 {
    if vms.is_empty() {
        return 0.0;
    }
    let mk = makespan(vms, schedule);
    vms.iter().map(|vm| vu(vm, dag, schedule, mk)).sum::<f64>() / vms.len() as f64
}

/// Task satisfaction `S(t) = ET(t, assigned) / min_k ET(t, k)`.
pub fn satisfaction(task_id: usize, dag: &Dag, vms: &[Vm], schedule: &Schedule) -> Option<f64> {
    let task = dag.get_task(task_id).ok()?;
    let vm_id = schedule.vm_for(task_id)?;
    let vm = vms.iter().find(|v| v.id == vm_id)?;
    let best = min_et(task.size, vms);
    if best <= 0.0 {
        return Some(1.0);
    }
    Some(et(task.size, vm) / best)
}

/// `VF = mean_t (S(t) - mean S)^2`, the variance of fairness.
pub fn vf(dag: &Dag, vms: &[Vm], schedule: &Schedule) -> f64 {
    let satisfactions: Vec<f64> = dag
        .tasks()
        .iter()
        .filter_map(|t| satisfaction(t.id, dag, vms, schedule))
        .collect();
    if satisfactions.is_empty() {
        return 0.0;
    }
    let mean = satisfactions.iter().sum::<f64>() / satisfactions.len() as f64;
    satisfactions.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / satisfactions.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn et_is_infinite_for_non_positive_capacity() {
        let vm = Vm::new(0, 0.0);
        assert_eq!(et(10.0, &vm), f64::INFINITY);
    }

    #[test]
    fn et_basic() {
        let vm = Vm::new(0, 2.0);
        assert!((et(10.0, &vm) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn t_trans_zero_on_same_vm() {
        let vm = Vm::new(0, 1.0);
        assert_eq!(t_trans(100.0, 10.0, &vm, &vm), 0.0);
    }

    #[test]
    fn t_trans_scales_by_bandwidth_ratio() {
        let a = Vm::new(0, 1.0).with_bandwidth(1, 5.0);
        let b = Vm::new(1, 1.0);
        // cost_at_reference computed at B=10, actual bandwidth 5 -> doubles.
        assert!((t_trans(10.0, 10.0, &a, &b) - 20.0).abs() < 1e-9);
    }
}
