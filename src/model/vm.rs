//! Heterogeneous VM (execution resource) model.

use std::collections::BTreeMap;

/// Capability key consulted by the metric kernel for task execution time.
pub const PROCESSING_CAPACITY: &str = "processingCapacity";

/// A virtual machine: a named bundle of capabilities plus a bandwidth vector to
/// every peer VM. A plain immutable value, not a handle to a live simulation
/// actor — there is no discrete-event simulation for it to coordinate with.
#[derive(Clone, Debug, PartialEq)]
pub struct Vm {
    pub id: usize,
    pub capabilities: BTreeMap<String, f64>,
    /// Bandwidth to each peer VM id. Self-bandwidth is conventionally 0 and unused
    /// (same-VM transmissions cost 0 by definition, see `metrics::t_trans`).
    pub bandwidth: BTreeMap<usize, f64>,
}

impl Vm {
    pub fn new(id: usize, processing_capacity: f64) -> Self {
        let mut capabilities = BTreeMap::new();
        capabilities.insert(PROCESSING_CAPACITY.to_string(), processing_capacity);
        Self {
            id,
            capabilities,
            bandwidth: BTreeMap::new(),
        }
    }

    pub fn with_bandwidth(mut self, peer: usize, bandwidth: f64) -> Self {
        self.bandwidth.insert(peer, bandwidth);
        self
    }

    pub fn processing_capacity(&self) -> f64 {
        self.capabilities.get(PROCESSING_CAPACITY).copied().unwrap_or(0.0)
    }

    pub fn bandwidth_to(&self, peer: usize) -> f64 {
        if peer == self.id {
            return 0.0;
        }
        self.bandwidth.get(&peer).copied().unwrap_or(0.0)
    }
}
