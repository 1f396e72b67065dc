//! Logical graph builder.
//!
//! Derives the directed reachability graph from the physical graph:
//!
//! 1. Every segment `(u, v)` with a usable forward strand yields `u -> v`.
//! 2. Every segment with a usable return strand yields `v -> u`.
//! 3. For each consecutive circuit pair of the ring, the last site of the
//!    first circuit is patched to the first site of the next one, but only
//!    when no directed path already connects them in the graph built so far.
//!
//! Patches are decided in ring order and later decisions see earlier
//! patches, so the graph is always rebuilt from scratch.

use ringwatch_core::logical::{EdgeRole, LogicalEdge, LogicalGraph, Provenance, MAX_DEPTH};
use ringwatch_core::plant::PlantConfig;
use ringwatch_core::roles::StrandRole;
use ringwatch_core::topology::PhysicalGraph;
use std::sync::Arc;
use tracing::{debug, error};

/// Builds logical graphs for one plant.
#[derive(Debug, Clone)]
pub struct LogicalGraphBuilder {
    plant: Arc<PlantConfig>,
    max_depth: usize,
}

impl LogicalGraphBuilder {
    pub fn new(plant: Arc<PlantConfig>) -> Self {
        Self {
            plant,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build<G: PhysicalGraph + ?Sized>(&self, physical: &G) -> LogicalGraph {
        let roles = &self.plant.roles;
        let mut dg = LogicalGraph::new();

        for node in physical.all_nodes() {
            dg.add_node(node.id.clone());
        }

        for seg in physical.all_segments() {
            let provenance = Provenance::Segment {
                id: seg.data.id.clone(),
                circuit: seg.data.circuit.clone(),
            };
            if roles.any_ok(StrandRole::Forward, &seg.data.strands) {
                dg.add_edge(LogicalEdge {
                    from: seg.source.to_string(),
                    to: seg.target.to_string(),
                    role: EdgeRole::Forward,
                    provenance: provenance.clone(),
                });
                debug!("Forward edge {} -> {}", seg.source, seg.target);
            }
            if roles.any_ok(StrandRole::Return, &seg.data.strands) {
                dg.add_edge(LogicalEdge {
                    from: seg.target.to_string(),
                    to: seg.source.to_string(),
                    role: EdgeRole::Return,
                    provenance,
                });
                debug!("Return edge {} -> {}", seg.target, seg.source);
            }
        }

        self.add_ring_patches(&mut dg);
        dg
    }

    fn add_ring_patches(&self, dg: &mut LogicalGraph) {
        if !dg.contains_node(&self.plant.center) {
            return;
        }
        for (current, next) in self.plant.ring_pairs() {
            let (Some(last), Some(first)) = (
                self.plant.circuit(current).last(),
                self.plant.circuit(next).first(),
            ) else {
                continue;
            };
            if !dg.contains_node(last) || !dg.contains_node(first) {
                continue;
            }

            let connected = match dg.has_path(last, first, self.max_depth) {
                Ok(found) => found,
                Err(fault) => {
                    error!("Ring patch check {} -> {} failed: {}", last, first, fault);
                    continue;
                }
            };
            if !connected {
                dg.add_edge(LogicalEdge {
                    from: last.clone(),
                    to: first.clone(),
                    role: EdgeRole::RingPatch,
                    provenance: Provenance::Patch {
                        from_circuit: current.to_string(),
                        to_circuit: next.to_string(),
                    },
                });
                debug!("Ring patch {} -> {} ({} -> {})", last, first, current, next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology_impl::PetPhysicalGraph;
    use ringwatch_core::types::{NodeData, SegmentData, StrandState};

    fn plant() -> Arc<PlantConfig> {
        Arc::new(
            PlantConfig::new("test")
                .with_circuit("C1", ["A1", "A2"])
                .with_circuit("C2", ["B1", "B2"]),
        )
    }

    fn physical(plant: &PlantConfig) -> PetPhysicalGraph {
        let mut g = PetPhysicalGraph::new();
        g.add_node(NodeData::center("SET"));
        for (circuit, nodes) in &plant.circuits {
            let mut prev = "SET".to_string();
            for node in nodes {
                g.add_node(NodeData::field(node.clone(), Some(circuit.clone())));
                g.set_segment(
                    &prev,
                    node,
                    SegmentData::healthy(format!("{}-{}", prev, node), Some(circuit.clone()), 16),
                );
                prev = node.clone();
            }
        }
        g
    }

    fn set_state(g: &mut PetPhysicalGraph, segment: &str, strands: &[u32], state: StrandState) {
        let seg = g.find_segment_mut(segment).unwrap();
        for s in strands {
            seg.strands.insert(*s, state);
        }
    }

    #[test]
    fn healthy_segments_yield_two_edges() {
        let plant = plant();
        let g = physical(&plant);
        let dg = LogicalGraphBuilder::new(plant).build(&g);
        assert_eq!(dg.node_count(), 5);
        assert_eq!(dg.edges_with_role(EdgeRole::Forward).count(), 4);
        assert_eq!(dg.edges_with_role(EdgeRole::Return).count(), 4);
        assert_eq!(dg.edge("SET", "A1").unwrap().segment(), Some("SET-A1"));
        assert_eq!(dg.edge("A1", "SET").unwrap().role, EdgeRole::Return);
    }

    #[test]
    fn healthy_ring_needs_no_patch() {
        let plant = plant();
        let g = physical(&plant);
        let dg = LogicalGraphBuilder::new(plant).build(&g);
        assert_eq!(dg.edges_with_role(EdgeRole::RingPatch).count(), 0);
    }

    #[test]
    fn directions_are_independent() {
        let plant = plant();
        let mut g = physical(&plant);
        set_state(&mut g, "SET-A1", &[1, 2], StrandState::Faulty);
        let dg = LogicalGraphBuilder::new(plant).build(&g);
        assert!(dg.edge("SET", "A1").is_none());
        assert!(dg.edge("A1", "SET").is_some());
    }

    #[test]
    fn one_ok_strand_keeps_direction() {
        let plant = plant();
        let mut g = physical(&plant);
        set_state(&mut g, "SET-A1", &[1], StrandState::Faulty);
        let dg = LogicalGraphBuilder::new(plant).build(&g);
        assert!(dg.edge("SET", "A1").is_some());
    }

    #[test]
    fn broken_return_adds_patch() {
        let plant = plant();
        let mut g = physical(&plant);
        // A2 can no longer climb back to the center through C1.
        set_state(&mut g, "A1-A2", &[3, 4], StrandState::Faulty);
        let dg = LogicalGraphBuilder::new(plant).build(&g);

        let patch = dg.edge("A2", "B1").expect("patch A2 -> B1");
        assert_eq!(patch.role, EdgeRole::RingPatch);
        assert_eq!(patch.segment(), None);
        assert_eq!(
            patch.provenance,
            Provenance::Patch {
                from_circuit: "C1".into(),
                to_circuit: "C2".into()
            }
        );
        // B2 -> A1 is still reachable through the center.
        assert!(dg.edge("B2", "A1").is_none());
    }

    #[test]
    fn without_center_no_patches_are_added() {
        let plant = plant();
        let mut g = PetPhysicalGraph::new();
        g.add_node(NodeData::field("A2", None));
        g.add_node(NodeData::field("B1", None));
        let dg = LogicalGraphBuilder::new(plant).build(&g);
        assert_eq!(dg.edge_count(), 0);
    }

    #[test]
    fn build_is_deterministic() {
        let plant = plant();
        let mut g = physical(&plant);
        set_state(&mut g, "A1-A2", &[3, 4], StrandState::Faulty);
        let builder = LogicalGraphBuilder::new(plant);
        assert_eq!(builder.build(&g), builder.build(&g));
    }
}
