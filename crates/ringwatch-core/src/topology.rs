//! Physical topology: sites and the undirected segments between them.
//!
//! This is a trait rather than a concrete type so that the store and the
//! logical-graph builder do not depend on a particular graph backend.

use crate::types::{NodeData, SegmentData};

/// A segment together with its two endpoints, in stored orientation.
#[derive(Debug, Clone, Copy)]
pub struct SegmentView<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub data: &'a SegmentData,
}

/// The physical graph of a plant.
pub trait PhysicalGraph {
    /// Add a node, or replace the attributes of an existing node with the same id.
    fn add_node(&mut self, data: NodeData);

    /// Get node data by id.
    fn get_node(&self, id: &str) -> Option<&NodeData>;

    fn contains_node(&self, id: &str) -> bool {
        self.get_node(id).is_some()
    }

    /// Add or replace the segment between `a` and `b`.
    /// Returns false if either endpoint is unknown.
    fn set_segment(&mut self, a: &str, b: &str, data: SegmentData) -> bool;

    /// Find a segment by stored id, or by `"a-b"` in either endpoint order.
    fn find_segment(&self, id: &str) -> Option<SegmentView<'_>>;

    /// Mutable access to the segment matched as in [`PhysicalGraph::find_segment`].
    fn find_segment_mut(&mut self, id: &str) -> Option<&mut SegmentData>;

    /// All nodes, in insertion order.
    fn all_nodes(&self) -> Vec<&NodeData>;

    /// All segments, in insertion order.
    fn all_segments(&self) -> Vec<SegmentView<'_>>;

    fn node_count(&self) -> usize;

    fn segment_count(&self) -> usize;

    /// Remove every node and segment.
    fn clear(&mut self);
}

/// Whether `id` names the segment `(source, target)`.
pub fn segment_matches(id: &str, source: &str, target: &str, data: &SegmentData) -> bool {
    data.id == id || pair_id(source, target) == id || pair_id(target, source) == id
}

/// The conventional id of the segment `a`–`b`.
pub fn pair_id(a: &str, b: &str) -> String {
    format!("{}-{}", a, b)
}
