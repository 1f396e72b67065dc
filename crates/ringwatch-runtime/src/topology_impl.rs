//! Concrete implementation of the PhysicalGraph trait using petgraph.
//!
//! This implementation uses petgraph's undirected `Graph` as the backing
//! store with a HashMap index for O(1) node lookup by id.

use petgraph::graph::{Graph, NodeIndex};
use petgraph::Undirected;
use ringwatch_core::topology::{segment_matches, PhysicalGraph, SegmentView};
use ringwatch_core::types::{NodeData, SegmentData};
use std::collections::HashMap;

/// Petgraph-backed physical graph.
#[derive(Debug, Clone)]
pub struct PetPhysicalGraph {
    graph: Graph<NodeData, SegmentData, Undirected>,
    /// Map from node id to petgraph's internal index.
    node_index: HashMap<String, NodeIndex>,
}

impl PetPhysicalGraph {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
            node_index: HashMap::new(),
        }
    }
}

impl Default for PetPhysicalGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicalGraph for PetPhysicalGraph {
    fn add_node(&mut self, data: NodeData) {
        if let Some(&idx) = self.node_index.get(&data.id) {
            self.graph[idx] = data;
            return;
        }
        let id = data.id.clone();
        let idx = self.graph.add_node(data);
        self.node_index.insert(id, idx);
    }

    fn get_node(&self, id: &str) -> Option<&NodeData> {
        self.node_index.get(id).map(|idx| &self.graph[*idx])
    }

    fn set_segment(&mut self, a: &str, b: &str, data: SegmentData) -> bool {
        let Some(&a_idx) = self.node_index.get(a) else {
            return false;
        };
        let Some(&b_idx) = self.node_index.get(b) else {
            return false;
        };

        // One segment per undirected pair
        if let Some(edge_idx) = self.graph.find_edge(a_idx, b_idx) {
            self.graph[edge_idx] = data;
        } else {
            self.graph.add_edge(a_idx, b_idx, data);
        }
        true
    }

    fn find_segment(&self, id: &str) -> Option<SegmentView<'_>> {
        self.all_segments()
            .into_iter()
            .find(|s| segment_matches(id, s.source, s.target, s.data))
    }

    fn find_segment_mut(&mut self, id: &str) -> Option<&mut SegmentData> {
        let edge_idx = self.graph.edge_indices().find(|&e| {
            self.graph.edge_endpoints(e).is_some_and(|(a, b)| {
                segment_matches(id, &self.graph[a].id, &self.graph[b].id, &self.graph[e])
            })
        })?;
        self.graph.edge_weight_mut(edge_idx)
    }

    fn all_nodes(&self) -> Vec<&NodeData> {
        self.graph.node_weights().collect()
    }

    fn all_segments(&self) -> Vec<SegmentView<'_>> {
        self.graph
            .edge_indices()
            .filter_map(|idx| {
                let (a, b) = self.graph.edge_endpoints(idx)?;
                Some(SegmentView {
                    source: &self.graph[a].id,
                    target: &self.graph[b].id,
                    data: &self.graph[idx],
                })
            })
            .collect()
    }

    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn segment_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn clear(&mut self) {
        self.graph.clear();
        self.node_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringwatch_core::types::StrandState;

    fn two_nodes() -> PetPhysicalGraph {
        let mut g = PetPhysicalGraph::new();
        g.add_node(NodeData::center("SET"));
        g.add_node(NodeData::field("CT01", Some("C7".into())));
        g
    }

    #[test]
    fn add_and_get_node() {
        let g = two_nodes();
        assert_eq!(g.node_count(), 2);
        assert!(g.get_node("SET").unwrap().is_center());
        assert!(g.get_node("missing").is_none());
    }

    #[test]
    fn re_adding_node_updates_attributes() {
        let mut g = two_nodes();
        g.add_node(NodeData::field("CT01", Some("C9".into())));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.get_node("CT01").unwrap().circuit.as_deref(), Some("C9"));
    }

    #[test]
    fn segment_requires_known_endpoints() {
        let mut g = two_nodes();
        assert!(!g.set_segment("SET", "CT99", SegmentData::healthy("x", None, 4)));
        assert!(g.set_segment("SET", "CT01", SegmentData::healthy("SET-CT01", None, 4)));
        assert_eq!(g.segment_count(), 1);
    }

    #[test]
    fn reversed_pair_replaces_segment() {
        let mut g = two_nodes();
        g.set_segment("SET", "CT01", SegmentData::healthy("SET-CT01", None, 4));
        g.set_segment("CT01", "SET", SegmentData::healthy("other", None, 4));
        assert_eq!(g.segment_count(), 1);
        assert_eq!(g.all_segments()[0].data.id, "other");
    }

    #[test]
    fn segment_found_by_id_or_either_pair_order() {
        let mut g = two_nodes();
        g.set_segment("SET", "CT01", SegmentData::healthy("feeder-7", None, 4));
        assert!(g.find_segment("feeder-7").is_some());
        assert!(g.find_segment("SET-CT01").is_some());
        assert!(g.find_segment("CT01-SET").is_some());
        assert!(g.find_segment("CT01-CT02").is_none());

        g.find_segment_mut("CT01-SET")
            .unwrap()
            .strands
            .insert(1, StrandState::Faulty);
        assert_eq!(g.find_segment("feeder-7").unwrap().data.state(1), StrandState::Faulty);
    }

    #[test]
    fn clear_empties_graph() {
        let mut g = two_nodes();
        g.set_segment("SET", "CT01", SegmentData::healthy("SET-CT01", None, 4));
        g.clear();
        assert_eq!(g.node_count(), 0);
        assert!(g.get_node("SET").is_none());
    }
}
