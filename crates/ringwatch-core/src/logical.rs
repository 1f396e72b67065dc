//! Logical reachability graph.
//!
//! A directed graph derived from strand state: explicit adjacency lists
//! keyed by node id. Reachability is answered by an iterative, depth-bounded
//! search that never recurses, so it terminates in bounded stack space even
//! on cyclic or malformed graphs.

use crate::error::TraversalFault;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

/// Hop limit for every reachability query.
pub const MAX_DEPTH: usize = 30;

/// Why a directed edge exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRole {
    /// A forward strand of the segment is usable.
    Forward,
    /// A return strand of the segment is usable.
    Return,
    /// A patch at the center closing a gap between two circuits.
    RingPatch,
}

/// Where a logical edge comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Provenance {
    Segment {
        id: String,
        circuit: Option<String>,
    },
    Patch {
        from_circuit: String,
        to_circuit: String,
    },
}

/// A derived directed edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalEdge {
    pub from: String,
    pub to: String,
    pub role: EdgeRole,
    pub provenance: Provenance,
}

impl LogicalEdge {
    /// The owning segment id; `None` for ring patches.
    pub fn segment(&self) -> Option<&str> {
        match &self.provenance {
            Provenance::Segment { id, .. } => Some(id),
            Provenance::Patch { .. } => None,
        }
    }
}

/// Directed reachability graph.
///
/// Holds no state beyond what the builder put into it; equality is
/// structural.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalGraph {
    nodes: BTreeSet<String>,
    adjacency: BTreeMap<String, Vec<LogicalEdge>>,
}

impl LogicalGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: impl Into<String>) {
        self.nodes.insert(id.into());
    }

    /// Add a directed edge, replacing an existing edge between the same
    /// endpoints. Endpoints are not added as nodes.
    pub fn add_edge(&mut self, edge: LogicalEdge) {
        let out = self.adjacency.entry(edge.from.clone()).or_default();
        match out.iter_mut().find(|e| e.to == edge.to) {
            Some(existing) => *existing = edge,
            None => out.push(edge),
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Outgoing edges of a node.
    pub fn successors(&self, id: &str) -> &[LogicalEdge] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&LogicalEdge> {
        self.successors(from).iter().find(|e| e.to == to)
    }

    pub fn edges(&self) -> impl Iterator<Item = &LogicalEdge> {
        self.adjacency.values().flatten()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Edges of one role.
    pub fn edges_with_role(&self, role: EdgeRole) -> impl Iterator<Item = &LogicalEdge> {
        self.edges().filter(move |e| e.role == role)
    }

    /// Whether `target` is reachable from `source` within `max_depth` hops.
    ///
    /// Depth-first with an explicit stack. A node equal to the source is
    /// trivially reachable. Fails when the source is unknown, or when the
    /// target is not reached and one of the source's own edges points
    /// outside the node set. Dangling edges further away are skipped.
    pub fn has_path<'a>(
        &'a self,
        source: &'a str,
        target: &str,
        max_depth: usize,
    ) -> Result<bool, TraversalFault> {
        if source == target {
            return Ok(true);
        }
        if !self.nodes.contains(source) {
            return Err(TraversalFault::UnknownNode(source.to_string()));
        }

        // Shallowest depth each node was reached at. A node is expanded
        // again only when found closer to the source.
        let mut best: HashMap<&'a str, usize> = HashMap::new();
        best.insert(source, 0);
        let mut stack: Vec<(&'a str, usize)> = vec![(source, 0)];
        // A dangling edge out of the source itself; elsewhere it is a dead end.
        let mut own_fault: Option<TraversalFault> = None;

        while let Some((node, depth)) = stack.pop() {
            if node == target {
                return Ok(true);
            }
            if depth >= max_depth {
                continue;
            }
            for edge in self.successors(node) {
                if !self.nodes.contains(&edge.to) {
                    if node == source {
                        own_fault.get_or_insert_with(|| TraversalFault::DanglingEdge {
                            from: node.to_string(),
                            to: edge.to.clone(),
                        });
                    } else {
                        warn!("Skipping dangling edge {} -> {}", node, edge.to);
                    }
                    continue;
                }
                let next = depth + 1;
                let seen = best.get(edge.to.as_str()).map_or(false, |d| *d <= next);
                if !seen {
                    best.insert(edge.to.as_str(), next);
                    stack.push((edge.to.as_str(), next));
                }
            }
        }
        match own_fault {
            Some(fault) => Err(fault),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg_edge(from: &str, to: &str) -> LogicalEdge {
        LogicalEdge {
            from: from.into(),
            to: to.into(),
            role: EdgeRole::Forward,
            provenance: Provenance::Segment {
                id: format!("{}-{}", from, to),
                circuit: None,
            },
        }
    }

    /// Directed cycle n0 -> n1 -> ... -> n{len-1} -> n0.
    fn cycle(len: usize) -> LogicalGraph {
        let mut g = LogicalGraph::new();
        for i in 0..len {
            g.add_node(format!("n{}", i));
        }
        for i in 0..len {
            g.add_edge(seg_edge(&format!("n{}", i), &format!("n{}", (i + 1) % len)));
        }
        g
    }

    #[test]
    fn self_is_always_reachable() {
        let g = LogicalGraph::new();
        assert_eq!(g.has_path("SET", "SET", MAX_DEPTH), Ok(true));
    }

    #[test]
    fn follows_direction() {
        let mut g = LogicalGraph::new();
        g.add_node("a");
        g.add_node("b");
        g.add_edge(seg_edge("a", "b"));
        assert_eq!(g.has_path("a", "b", MAX_DEPTH), Ok(true));
        assert_eq!(g.has_path("b", "a", MAX_DEPTH), Ok(false));
    }

    #[test]
    fn target_exactly_at_depth_bound_is_found() {
        let g = cycle(40);
        assert_eq!(g.has_path("n0", "n30", MAX_DEPTH), Ok(true));
    }

    #[test]
    fn cyclic_graph_beyond_bound_terminates_false() {
        let g = cycle(40);
        assert_eq!(g.has_path("n0", "n31", MAX_DEPTH), Ok(false));
        assert_eq!(g.has_path("n0", "n39", MAX_DEPTH), Ok(false));
    }

    #[test]
    fn shorter_path_found_after_longer_one() {
        // The search reaches d through a -> b -> c first; the shorter
        // a -> x -> d route must still bring t within a bound of 3.
        let mut g = LogicalGraph::new();
        for n in ["a", "b", "c", "d", "x", "t"] {
            g.add_node(n);
        }
        g.add_edge(seg_edge("a", "x"));
        g.add_edge(seg_edge("a", "b"));
        g.add_edge(seg_edge("b", "c"));
        g.add_edge(seg_edge("c", "d"));
        g.add_edge(seg_edge("x", "d"));
        g.add_edge(seg_edge("d", "t"));
        assert_eq!(g.has_path("a", "t", 3), Ok(true));
        assert_eq!(g.has_path("a", "t", 2), Ok(false));
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let g = cycle(100_000);
        assert_eq!(g.has_path("n0", "n99999", usize::MAX), Ok(true));
    }

    #[test]
    fn dangling_edge_is_a_fault() {
        let mut g = LogicalGraph::new();
        g.add_node("a");
        g.add_edge(seg_edge("a", "ghost"));
        assert_eq!(
            g.has_path("a", "b", MAX_DEPTH),
            Err(TraversalFault::DanglingEdge {
                from: "a".into(),
                to: "ghost".into()
            })
        );
    }

    #[test]
    fn dangling_edge_elsewhere_is_a_dead_end() {
        let mut g = LogicalGraph::new();
        for n in ["a", "b", "c"] {
            g.add_node(n);
        }
        g.add_edge(seg_edge("a", "b"));
        g.add_edge(seg_edge("b", "ghost"));
        g.add_edge(seg_edge("a", "c"));
        assert_eq!(g.has_path("a", "c", MAX_DEPTH), Ok(true));
        assert_eq!(g.has_path("c", "a", MAX_DEPTH), Ok(false));
        assert!(g.has_path("b", "a", MAX_DEPTH).is_err());
    }

    #[test]
    fn own_dangling_edge_does_not_hide_a_real_path() {
        let mut g = LogicalGraph::new();
        g.add_node("a");
        g.add_node("b");
        g.add_edge(seg_edge("a", "ghost"));
        g.add_edge(seg_edge("a", "b"));
        assert_eq!(g.has_path("a", "b", MAX_DEPTH), Ok(true));
    }

    #[test]
    fn unknown_source_is_a_fault() {
        let g = LogicalGraph::new();
        assert!(matches!(
            g.has_path("x", "y", MAX_DEPTH),
            Err(TraversalFault::UnknownNode(_))
        ));
    }

    #[test]
    fn add_edge_replaces_same_endpoints() {
        let mut g = LogicalGraph::new();
        g.add_node("a");
        g.add_node("b");
        g.add_edge(seg_edge("a", "b"));
        let mut patch = seg_edge("a", "b");
        patch.role = EdgeRole::RingPatch;
        g.add_edge(patch);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge("a", "b").map(|e| e.role), Some(EdgeRole::RingPatch));
    }
}
