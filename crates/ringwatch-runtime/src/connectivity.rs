//! Bidirectional reachability between the center and a node.
//!
//! A node is `connected` only when the center can reach it and it can
//! reach the center. Traversal faults are contained per node: they show up
//! as an `error` status for that node and never abort a network-wide query.

use ringwatch_core::error::TraversalFault;
use ringwatch_core::logical::{LogicalGraph, MAX_DEPTH};
use ringwatch_core::types::Connectivity;
use std::collections::BTreeMap;
use tracing::{error, warn};

/// Connectivity queries over one logical graph.
#[derive(Debug, Clone, Copy)]
pub struct ConnectivityAnalyzer<'g> {
    graph: &'g LogicalGraph,
    center: &'g str,
    max_depth: usize,
}

impl<'g> ConnectivityAnalyzer<'g> {
    pub fn new(graph: &'g LogicalGraph, center: &'g str) -> Self {
        Self {
            graph,
            center,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Status of one node.
    pub fn status(&self, node: &str) -> Connectivity {
        if node == self.center {
            return Connectivity::Connected;
        }
        if !self.graph.contains_node(node) {
            warn!("Connectivity check for unknown node {}", node);
            return Connectivity::Error;
        }
        if !self.graph.contains_node(self.center) {
            return Connectivity::Isolated;
        }

        match self.both_ways(node) {
            Ok(true) => Connectivity::Connected,
            Ok(false) => Connectivity::Isolated,
            Err(fault) => {
                error!("Connectivity check for {} failed: {}", node, fault);
                Connectivity::Error
            }
        }
    }

    /// Status of every node in `nodes`, keyed by id.
    pub fn statuses<I, S>(&self, nodes: I) -> BTreeMap<String, Connectivity>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        nodes
            .into_iter()
            .map(|n| {
                let status = self.status(n.as_ref());
                (n.as_ref().to_string(), status)
            })
            .collect()
    }

    fn both_ways(&self, node: &str) -> Result<bool, TraversalFault> {
        Ok(self.graph.has_path(self.center, node, self.max_depth)?
            && self.graph.has_path(node, self.center, self.max_depth)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringwatch_core::logical::{EdgeRole, LogicalEdge, Provenance};

    fn edge(from: &str, to: &str) -> LogicalEdge {
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

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> LogicalGraph {
        let mut g = LogicalGraph::new();
        for n in nodes {
            g.add_node(*n);
        }
        for (a, b) in edges {
            g.add_edge(edge(a, b));
        }
        g
    }

    #[test]
    fn center_is_always_connected() {
        let g = LogicalGraph::new();
        assert_eq!(ConnectivityAnalyzer::new(&g, "SET").status("SET"), Connectivity::Connected);
    }

    #[test]
    fn both_directions_are_required() {
        let g = graph(
            &["SET", "A", "B"],
            &[("SET", "A"), ("A", "SET"), ("SET", "B")],
        );
        let analyzer = ConnectivityAnalyzer::new(&g, "SET");
        assert_eq!(analyzer.status("A"), Connectivity::Connected);
        assert_eq!(analyzer.status("B"), Connectivity::Isolated);
    }

    #[test]
    fn unknown_node_is_an_error() {
        let g = graph(&["SET"], &[]);
        assert_eq!(ConnectivityAnalyzer::new(&g, "SET").status("CT99"), Connectivity::Error);
    }

    #[test]
    fn fault_is_contained_to_the_affected_node() {
        // B's only way back runs through an edge to a node that does not exist.
        let g = graph(
            &["SET", "A", "B"],
            &[("SET", "A"), ("A", "SET"), ("SET", "B"), ("B", "ghost")],
        );
        let statuses = ConnectivityAnalyzer::new(&g, "SET").statuses(["A", "B"]);
        assert_eq!(statuses["A"], Connectivity::Connected);
        assert_eq!(statuses["B"], Connectivity::Error);
    }

    #[test]
    fn depth_cap_is_configurable() {
        let g = graph(
            &["SET", "A", "B"],
            &[("SET", "A"), ("A", "B"), ("B", "A"), ("A", "SET")],
        );
        let analyzer = ConnectivityAnalyzer::new(&g, "SET");
        assert_eq!(analyzer.status("B"), Connectivity::Connected);
        assert_eq!(analyzer.with_max_depth(1).status("B"), Connectivity::Isolated);
    }
}
