//! Ring integrity: whether each circuit hands over to the next one.
//!
//! For every consecutive pair in ring order, the last site of the first
//! circuit must reach the first site of the next over the logical graph.
//! There is exactly one link per ring entry, including the wrap-around.

use ringwatch_core::logical::{LogicalGraph, MAX_DEPTH};
use ringwatch_core::plant::PlantConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::error;

/// One circuit-to-circuit handover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RingLink {
    pub from_circuit: String,
    pub to_circuit: String,
    /// Last site of `from_circuit`, if it has any.
    pub last: Option<String>,
    /// First site of `to_circuit`, if it has any.
    pub first: Option<String>,
    pub intact: bool,
}

impl RingLink {
    /// `"C1→C2"`.
    pub fn key(&self) -> String {
        format!("{}→{}", self.from_circuit, self.to_circuit)
    }
}

/// Result of a ring check, in ring order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RingIntegrity {
    pub links: Vec<RingLink>,
}

impl RingIntegrity {
    pub fn is_intact(&self) -> bool {
        self.links.iter().all(|l| l.intact)
    }

    pub fn broken(&self) -> impl Iterator<Item = &RingLink> {
        self.links.iter().filter(|l| !l.intact)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// `"c→c′"` to intact flag.
    pub fn as_map(&self) -> BTreeMap<String, bool> {
        self.links.iter().map(|l| (l.key(), l.intact)).collect()
    }
}

/// Checks ring handovers of one plant over one logical graph.
#[derive(Debug, Clone, Copy)]
pub struct RingIntegrityChecker<'g> {
    graph: &'g LogicalGraph,
    plant: &'g PlantConfig,
    max_depth: usize,
}

impl<'g> RingIntegrityChecker<'g> {
    pub fn new(graph: &'g LogicalGraph, plant: &'g PlantConfig) -> Self {
        Self {
            graph,
            plant,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn check(&self) -> RingIntegrity {
        let links = self
            .plant
            .ring_pairs()
            .map(|(current, next)| {
                let last = self.plant.circuit(current).last().cloned();
                let first = self.plant.circuit(next).first().cloned();
                let intact = match (&last, &first) {
                    (Some(last), Some(first)) => self.handover(last, first),
                    _ => false,
                };
                RingLink {
                    from_circuit: current.to_string(),
                    to_circuit: next.to_string(),
                    last,
                    first,
                    intact,
                }
            })
            .collect();
        RingIntegrity { links }
    }

    fn handover(&self, last: &str, first: &str) -> bool {
        // A circuit handing over to itself is never a valid ring.
        if last == first {
            return false;
        }
        if !self.graph.contains_node(last) || !self.graph.contains_node(first) {
            return false;
        }
        match self.graph.has_path(last, first, self.max_depth) {
            Ok(found) => found,
            Err(fault) => {
                error!("Ring check {} -> {} failed: {}", last, first, fault);
                false
            }
        }
    }
}
