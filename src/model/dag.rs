//! DAG of workflow tasks.
//!
//! Tasks are stored in a flat `Vec` indexed by id and referenced only by id
//! elsewhere (`entry`, `exit`), never by direct reference. `Dag` is handed a
//! finished graph from a caller it has no reason to trust and validates it
//! once at construction, returning `Result` instead of panicking on a bad id.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{SchedulerError, Result};
use crate::model::task::Task;

/// Lightweight diagnostic summary of a `Dag`'s shape, independent of any VM
/// fleet or scheduling run. Grounded on the teacher's `dag_stats.rs`
/// (`DagStats`), scoped down to the fields this crate's plain scalar-size task
/// model actually supports (no per-task data-item input/output sizes here,
/// since tasks carry a single `size` rather than a DAX-style input/output set).
#[derive(Clone, Debug, PartialEq)]
pub struct DagStats {
    pub task_count: usize,
    /// Sum of `size` over every task.
    pub total_comp_size: f64,
    /// Number of levels (1 + the deepest task's level).
    pub depth: usize,
    /// Size of the widest level.
    pub width: usize,
    /// Number of tasks at each level, ascending by level.
    pub level_widths: BTreeMap<usize, usize>,
}

#[derive(Clone, Debug)]
pub struct Dag {
    tasks: Vec<Task>,
    entry: BTreeSet<usize>,
    exit: BTreeSet<usize>,
}

impl Dag {
    /// Builds a `Dag` from a task list, validating invariant I1 (acyclic, at
    /// least one entry task, at least one exit task) and that every referenced
    /// predecessor/successor id actually exists.
    ///
    /// `tasks` need not be sorted by id, but every id in `0..tasks.len()` minus
    /// gaps is accepted; tasks are re-indexed into `id -> position` via a direct
    /// `Vec` because ids are taken as a dense `0..n` range.
    pub fn new(tasks: Vec<Task>) -> Result<Self> {
        let n = tasks.len();
        let mut by_id = vec![None; n];
        for task in &tasks {
            if task.id >= n {
                return Err(SchedulerError::UnknownTask(task.id));
            }
            by_id[task.id] = Some(task.clone());
        }
        let tasks: Vec<Task> = by_id
            .into_iter()
            .enumerate()
            .map(|(id, t)| t.ok_or(SchedulerError::UnknownTask(id)))
            .collect::<Result<_>>()?;

        for task in &tasks {
            for &p in task.pred.iter().chain(task.succ.iter()) {
                if p >= n {
                    return Err(SchedulerError::UnknownTask(p));
                }
            }
        }

        let entry: BTreeSet<usize> = tasks.iter().filter(|t| t.is_entry()).map(|t| t.id).collect();
        let exit: BTreeSet<usize> = tasks.iter().filter(|t| t.is_exit()).map(|t| t.id).collect();

        if entry.is_empty() {
            return Err(SchedulerError::MalformedGraph {
                reason: "no entry task (every task has a predecessor)".to_string(),
            });
        }
        if exit.is_empty() {
            return Err(SchedulerError::MalformedGraph {
                reason: "no exit task (every task has a successor)".to_string(),
            });
        }

        let dag = Self { tasks, entry, exit };
        dag.topological_order()?;
        Ok(dag)
    }

    pub fn get_task(&self, id: usize) -> Result<&Task> {
        self.tasks.get(id).ok_or(SchedulerError::UnknownTask(id))
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn entry_tasks(&self) -> &BTreeSet<usize> {
        &self.entry
    }

    pub fn exit_tasks(&self) -> &BTreeSet<usize> {
        &self.exit
    }

    /// Kahn's algorithm: doubles as the acyclicity check (I1) and produces a
    /// valid processing order for callers that need one (topsort in the
    /// teacher's `schedulers/common.rs` uses a DFS postorder instead; Kahn's is
    /// used here because it detects cycles without recursion depth concerns on
    /// wide/deep DAGs).
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        let n = self.tasks.len();
        let mut in_degree: Vec<usize> = self.tasks.iter().map(|t| t.pred.len()).collect();
        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(t) = queue.pop_front() {
            order.push(t);
            for &s in &self.tasks[t].succ {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    queue.push_back(s);
                }
            }
        }
        if order.len() != n {
            return Err(SchedulerError::MalformedGraph {
                reason: "cycle detected: topological sort could not order every task".to_string(),
            });
        }
        Ok(order)
    }

    /// Diagnostic summary of this DAG's shape (task count, total computational
    /// size, depth, and per-level widths), independent of any VM fleet. Callers
    /// inspecting a workflow ahead of (or instead of) a scheduling run can use
    /// this without re-deriving the level partition DCP computes internally.
    pub fn stats(&self) -> DagStats {
        let order = self.topological_order().unwrap_or_default();
        let mut level = vec![0usize; self.tasks.len()];
        for &t in &order {
            let task = &self.tasks[t];
            if !task.pred.is_empty() {
                level[t] = task.pred.iter().map(|&p| level[p] + 1).max().unwrap_or(0);
            }
        }
        let mut level_widths: BTreeMap<usize, usize> = BTreeMap::new();
        for &l in &level {
            *level_widths.entry(l).or_insert(0) += 1;
        }
        DagStats {
            task_count: self.tasks.len(),
            total_comp_size: self.tasks.iter().map(|t| t.size).sum(),
            depth: level_widths.len(),
            width: level_widths.values().copied().max().unwrap_or(0),
            level_widths,
        }
    }
}
