//! Task-proposing deferred-acceptance stable matching under quotas.
//!
//! Standard hospital/residents-style Gale-Shapley: tasks propose down their
//! preference list, VMs hold the best `threshold(k,l)` proposals seen so far
//! and reject the rest. Since every preference list is a total order over the
//! whole level and `Σ threshold >= level_size` (guaranteed by `quota::thresholds`),
//! every task is matched before its list is exhausted; `InsufficientQuota` is
//! reachable only if that invariant were ever violated, which would be a bug.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{Result, SchedulerError};

/// Runs the matching for a single level and returns the task -> VM assignment.
pub fn stable_match(
    level: usize,
    level_tasks: &[usize],
    task_prefs: &BTreeMap<usize, Vec<usize>>,
    vm_rank_position: &BTreeMap<usize, usize>,
    quotas: &BTreeMap<usize, usize>,
) -> Result<BTreeMap<usize, usize>> {
    let mut pointer: BTreeMap<usize, usize> = level_tasks.iter().map(|&t| (t, 0)).collect();
    let mut holds: BTreeMap<usize, BTreeSet<usize>> = quotas.keys().map(|&k| (k, BTreeSet::new())).collect();
    let mut queue: VecDeque<usize> = level_tasks.iter().copied().collect();

    while let Some(task) = queue.pop_front() {
        let prefs = task_prefs
            .get(&task)
            .ok_or(SchedulerError::UnknownTask(task))?;
        let idx = pointer[&task];
        if idx >= prefs.len() {
            return Err(SchedulerError::InsufficientQuota {
                level,
                needed: level_tasks.len(),
                available: quotas.values().sum(),
            });
        }
        let vm = prefs[idx];
        let held = holds.entry(vm).or_default();
        held.insert(task);

        let quota = *quotas.get(&vm).unwrap_or(&0);
        if held.len() > quota {
            let mut ranked: Vec<usize> = held.iter().copied().collect();
            ranked.sort_by_key(|t| vm_rank_position.get(t).copied().unwrap_or(usize::MAX));
            let rejected: Vec<usize> = ranked.split_off(quota);
            *held = ranked.into_iter().collect();
            for rejected_task in rejected {
                held.remove(&rejected_task);
                *pointer.get_mut(&rejected_task).unwrap() += 1;
                queue.push_back(rejected_task);
            }
        }
    }

    let mut assignment = BTreeMap::new();
    for (vm, tasks) in holds {
        for task in tasks {
            assignment.insert(task, vm);
        }
    }
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_every_task_when_quota_covers_level() {
        let level_tasks = vec![0, 1, 2];
        let task_prefs: BTreeMap<usize, Vec<usize>> = [(0, vec![0, 1]), (1, vec![0, 1]), (2, vec![1, 0])]
            .into_iter()
            .collect();
        let vm_rank_position: BTreeMap<usize, usize> = [(0, 0), (1, 1), (2, 2)].into_iter().collect();
        let quotas: BTreeMap<usize, usize> = [(0, 2), (1, 2)].into_iter().collect();

        let assignment = stable_match(0, &level_tasks, &task_prefs, &vm_rank_position, &quotas).unwrap();
        assert_eq!(assignment.len(), 3);
        for &vm in assignment.values() {
            assert!(vm == 0 || vm == 1);
        }
    }

    #[test]
    fn rejected_tasks_advance_to_next_choice() {
        // Both tasks prefer vm 0 but it only holds 1; the loser must land on vm 1.
        let level_tasks = vec![0, 1];
        let task_prefs: BTreeMap<usize, Vec<usize>> = [(0, vec![0, 1]), (1, vec![0, 1])].into_iter().collect();
        // Task 0 has higher rank (lower position number) so VM 0 prefers it.
        let vm_rank_position: BTreeMap<usize, usize> = [(0, 0), (1, 1)].into_iter().collect();
        let quotas: BTreeMap<usize, usize> = [(0, 1), (1, 1)].into_iter().collect();

        let assignment = stable_match(0, &level_tasks, &task_prefs, &vm_rank_position, &quotas).unwrap();
        assert_eq!(assignment[&0], 0);
        assert_eq!(assignment[&1], 1);
    }
}
