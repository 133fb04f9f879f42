//! Pipeline orchestrator — sequences DCP → SMGT → LOTD.

use log::info;

use crate::config::SchedulerConfig;
use crate::dcp;
use crate::error::{Result, SchedulerError};
use crate::lotd;
use crate::metrics;
use crate::model::comm::CommCostTable;
use crate::model::dag::Dag;
use crate::model::vm::Vm;
use crate::schedule::Schedule;
use crate::smgt;

/// Produces a full `Schedule` for `dag` on `vms` at the given communication-to-
/// computation ratio. Deterministic: identical inputs (including the tie-break
/// rules documented throughout this crate) always produce a byte-identical
/// `Schedule`.
pub fn schedule(dag: &Dag, vms: &[Vm], ccr: f64, config: &SchedulerConfig) -> Result<Schedule> {
    validate_fleet(vms)?;
    let costs = CommCostTable::build(dag, vms, ccr);

    let dcp_result = dcp::run(dag, vms, &costs, config)?;
    info!(
        "DCP: {} levels, critical path length {:.6}, {} tasks on the critical path",
        dcp_result.levels.len(),
        dcp_result.critical_path_length,
        dcp_result.critical_path.len()
    );

    let pre_schedule = smgt::run(dag, vms, &costs, &dcp_result, config)?;
    let pre_makespan = metrics::makespan(vms, &pre_schedule);
    info!("SMGT: pre-schedule makespan {:.6}", pre_makespan);

    let final_schedule = lotd::run(dag, vms, &costs, pre_schedule, config);
    let final_makespan = metrics::makespan(vms, &final_schedule);
    info!(
        "LOTD: {} duplicates placed, makespan {:.6} -> {:.6}",
        final_schedule.duplicates.len(),
        pre_makespan,
        final_makespan
    );

    Ok(final_schedule)
}

/// Rejects a fleet where a VM's bandwidth vector names a peer id that isn't
/// one of `vms`' own ids (`SchedulerError::UnknownVM`, spec.md §7) before any
/// phase runs, rather than letting a bogus peer id silently read as "no
/// bandwidth entry, defaults to 0" deep inside `metrics::t_trans`.
fn validate_fleet(vms: &[Vm]) -> Result<()> {
    let known: std::collections::BTreeSet<usize> = vms.iter().map(|vm| vm.id).collect();
    for vm in vms {
        for &peer in vm.bandwidth.keys() {
            if !known.contains(&peer) {
                return Err(SchedulerError::UnknownVM(peer));
            }
        }
    }
    Ok(())
}
