//! Scheduling decision trace — structured ambient logging alongside `log`.
//!
//! A serde-tagged event enum that can be serialized to JSON lines for offline
//! inspection. This crate has no live simulation clock, so events are pushed
//! explicitly by whichever phase produces them and carry the scheduling times
//! that phase already computed, rather than being stamped by a running clock.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    LevelMatched {
        level: usize,
        task_count: usize,
        quotas: std::collections::BTreeMap<usize, usize>,
    },
    TaskScheduled {
        task_id: usize,
        vm_id: usize,
        ast: f64,
        aft: f64,
    },
    DuplicatePlaced {
        task_id: usize,
        host_vm_id: usize,
        ast: f64,
        aft: f64,
    },
    DuplicateSkipped {
        task_id: usize,
        host_vm_id: usize,
        reason: String,
    },
}

/// An append-only collector a caller can thread through `schedule()` to get a
/// structured record of every decision, in addition to the `log` crate output
/// each phase already emits at `debug`/`info` level.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_tagged_json() {
        let mut log = TraceLog::new();
        log.push(TraceEvent::TaskScheduled {
            task_id: 0,
            vm_id: 1,
            ast: 0.0,
            aft: 10.0,
        });
        let json = log.to_json().unwrap();
        assert!(json.contains("\"type\": \"task_scheduled\""));
    }
}
