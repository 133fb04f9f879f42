//! SMGT — Stable-Matching Game Theory assignment.
//!
//! Processes DAG levels in increasing order, running one quota-constrained
//! deferred-acceptance matching per level, then emits the pre-schedule. Split
//! into `preferences`/`quota`/`matching`/`preschedule` submodules, one file
//! per concern.

pub mod matching;
pub mod preferences;
pub mod preschedule;
pub mod quota;

use std::collections::BTreeMap;

use log::debug;

use crate::config::SchedulerConfig;
use crate::dcp::DcpResult;
use crate::error::Result;
use crate::model::comm::CommCostTable;
use crate::model::dag::Dag;
use crate::model::vm::Vm;
use crate::schedule::Schedule;

/// Runs SMGT over every level in `dcp.levels` and returns the pre-schedule.
pub fn run(dag: &Dag, vms: &[Vm], costs: &CommCostTable, dcp: &DcpResult, _config: &SchedulerConfig) -> Result<Schedule> {
    let mut assignment: BTreeMap<usize, usize> = BTreeMap::new();

    for (&level, level_tasks) in &dcp.levels {
        let quotas = quota::thresholds(level_tasks.len(), vms);
        let task_prefs = preferences::task_preferences(level_tasks, dag, vms);
        let vm_rank_position = preferences::vm_rank_position(level_tasks, &dcp.ranks);

        let level_assignment =
            matching::stable_match(level, level_tasks, &task_prefs, &vm_rank_position, &quotas)?;

        debug!(
            "SMGT level {} matched {} tasks across {} VMs (quotas: {:?})",
            level,
            level_assignment.len(),
            vms.len(),
            quotas
        );

        assignment.extend(level_assignment);
    }

    preschedule::build(dag, vms, costs, dcp, &assignment)
}
