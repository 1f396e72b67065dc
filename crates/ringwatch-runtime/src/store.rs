//! Topology store: the single source of truth for a plant's physical graph.
//!
//! Every read that iterates the graph and every mutation takes the same
//! exclusive lock. The derived logical graph is cached next to the physical
//! graph and tagged with the store version it was built from; any effective
//! mutation bumps the version, and the next request rebuilds under the same
//! lock so the derived graph always reflects one consistent physical state.

use crate::builder::LogicalGraphBuilder;
use crate::topology_impl::PetPhysicalGraph;
use chrono::Utc;
use ringwatch_core::error::{RingError, Result};
use ringwatch_core::logical::LogicalGraph;
use ringwatch_core::plant::PlantConfig;
use ringwatch_core::roles::{StrandRole, StrandRoles};
use ringwatch_core::snapshot::{Snapshot, SnapshotEdge, SnapshotNode};
use ringwatch_core::topology::{pair_id, PhysicalGraph};
use ringwatch_core::types::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Outcome of a single-strand write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiberUpdate {
    /// Stored id of the matched segment.
    pub segment_id: String,
    pub strand: u32,
    pub old_state: StrandState,
    pub new_state: StrandState,
}

impl FiberUpdate {
    pub fn changed(&self) -> bool {
        self.old_state != self.new_state
    }
}

/// A consistent read of the store at one version.
#[derive(Debug, Clone)]
pub struct TopologyView {
    pub version: u64,
    pub graph: Arc<LogicalGraph>,
    pub segments: Vec<SegmentRecord>,
    pub field_nodes: Vec<String>,
}

#[derive(Debug)]
struct CachedGraph {
    version: u64,
    graph: Arc<LogicalGraph>,
}

#[derive(Debug, Default)]
struct TopologyState {
    graph: PetPhysicalGraph,
    positions: BTreeMap<String, Position>,
    version: u64,
    cache: Option<CachedGraph>,
    builds: u64,
}

impl TopologyState {
    fn invalidate(&mut self) {
        self.version += 1;
        self.cache = None;
    }
}

/// Lock-guarded physical topology of one plant.
#[derive(Debug)]
pub struct TopologyStore {
    plant: Arc<PlantConfig>,
    builder: LogicalGraphBuilder,
    state: Mutex<TopologyState>,
}

impl TopologyStore {
    /// An empty store; call [`TopologyStore::initialize`] before use.
    pub fn new(plant: Arc<PlantConfig>) -> Self {
        Self {
            builder: LogicalGraphBuilder::new(plant.clone()),
            plant,
            state: Mutex::new(TopologyState::default()),
        }
    }

    /// Replace the builder, e.g. to change the traversal depth cap.
    pub fn with_builder(mut self, builder: LogicalGraphBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn plant(&self) -> &PlantConfig {
        &self.plant
    }

    fn lock(&self) -> MutexGuard<'_, TopologyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear and repopulate from `snapshot`, or build the default topology.
    pub fn initialize(&self, snapshot: Option<&Snapshot>) {
        let mut state = self.lock();
        state.graph.clear();
        state.positions.clear();

        match snapshot {
            Some(snapshot) => self.load_snapshot(&mut state, snapshot),
            None => self.load_default(&mut state),
        }

        state.invalidate();
        info!(
            "Topology initialized for plant {} ({} nodes, {} segments)",
            self.plant.id,
            state.graph.node_count(),
            state.graph.segment_count()
        );
    }

    fn load_default(&self, state: &mut TopologyState) {
        let plant = &*self.plant;
        let total = plant.roles.total;
        state.graph.add_node(NodeData::center(&plant.center));

        for (circuit, nodes) in &plant.circuits {
            for node in nodes {
                state
                    .graph
                    .add_node(NodeData::field(node.clone(), Some(circuit.clone())));
            }
        }

        for (circuit, nodes) in &plant.circuits {
            let Some(first) = nodes.first() else {
                continue;
            };
            let mut chain = vec![(&plant.center, first)];
            chain.extend(nodes.windows(2).map(|w| (&w[0], &w[1])));
            for (a, b) in chain {
                state.graph.set_segment(
                    a,
                    b,
                    SegmentData::healthy(pair_id(a, b), Some(circuit.clone()), total),
                );
            }
        }

        for (node, pos) in &plant.positions {
            if state.graph.contains_node(node) {
                state.positions.insert(node.clone(), *pos);
            }
        }
    }

    fn load_snapshot(&self, state: &mut TopologyState, snapshot: &Snapshot) {
        let total = self.plant.roles.total;

        // The plant's center id is the only center.
        for node in &snapshot.nodes {
            let is_center = node.id == self.plant.center;
            if node.kind == NodeKind::Center && !is_center {
                warn!(
                    "Snapshot center {} differs from plant center {}; reading it as a field node",
                    node.id, self.plant.center
                );
            }
            state.graph.add_node(NodeData {
                id: node.id.clone(),
                kind: if is_center { NodeKind::Center } else { NodeKind::Field },
                circuit: if is_center { None } else { node.circuit.clone() },
                label: node.label.clone(),
            });
        }
        if !state.graph.contains_node(&self.plant.center) {
            warn!("Snapshot has no center node {}; adding it", self.plant.center);
            state.graph.add_node(NodeData::center(&self.plant.center));
        }

        for edge in &snapshot.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !state.graph.contains_node(endpoint) {
                    warn!("Snapshot edge references unknown node {}; adding it", endpoint);
                    state.graph.add_node(NodeData::field(endpoint.clone(), None));
                }
            }
            let id = edge
                .id
                .clone()
                .unwrap_or_else(|| pair_id(&edge.source, &edge.target));
            let strands = normalize_strands(&id, &edge.fibers, total);
            state.graph.set_segment(
                &edge.source,
                &edge.target,
                SegmentData {
                    id,
                    circuit: edge.circuit.clone(),
                    strands,
                },
            );
        }

        state.positions = snapshot.node_positions.clone();
    }

    /// One canonical record per undirected pair, sorted by (circuit, id).
    /// Segments without a circuit sort last.
    pub fn segments(&self) -> Vec<SegmentRecord> {
        let state = self.lock();
        self.segments_of(&state)
    }

    fn segments_of(&self, state: &TopologyState) -> Vec<SegmentRecord> {
        let roles = &self.plant.roles;
        let mut seen = BTreeSet::new();
        let mut records = Vec::new();

        for seg in state.graph.all_segments() {
            let key = if seg.source <= seg.target {
                (seg.source, seg.target)
            } else {
                (seg.target, seg.source)
            };
            if !seen.insert(key) {
                continue;
            }
            let strands = seg.data.strands.clone();
            records.push(SegmentRecord {
                id: seg.data.id.clone(),
                source: seg.source.to_string(),
                target: seg.target.to_string(),
                circuit: seg.data.circuit.clone(),
                comm_status: comm_status(roles, &strands),
                strands,
            });
        }

        records.sort_by(|a, b| {
            (a.circuit.is_none(), &a.circuit, &a.id).cmp(&(b.circuit.is_none(), &b.circuit, &b.id))
        });
        records
    }

    /// Set one strand of a segment.
    ///
    /// The segment is matched by stored id or by `"a-b"` in either order.
    /// Writing the current state again succeeds without invalidating the
    /// cached logical graph.
    pub fn update_fiber(&self, segment_id: &str, strand: u32, new_state: StrandState) -> Result<FiberUpdate> {
        let mut state = self.lock();
        let segment = state
            .graph
            .find_segment_mut(segment_id)
            .ok_or_else(|| RingError::segment_not_found(segment_id))?;
        let stored_id = segment.id.clone();
        let slot = segment
            .strands
            .get_mut(&strand)
            .ok_or_else(|| RingError::strand_not_found(segment_id, strand))?;

        let old_state = *slot;
        *slot = new_state;
        let update = FiberUpdate {
            segment_id: stored_id,
            strand,
            old_state,
            new_state,
        };
        if update.changed() {
            state.invalidate();
        }
        Ok(update)
    }

    /// Set every faulty strand of a segment back to `ok`; returns how many changed.
    pub fn restore_segment(&self, segment_id: &str) -> Result<usize> {
        let mut state = self.lock();
        let segment = state
            .graph
            .find_segment_mut(segment_id)
            .ok_or_else(|| RingError::segment_not_found(segment_id))?;

        let mut changed = 0;
        for strand in segment.strands.values_mut() {
            if *strand == StrandState::Faulty {
                *strand = StrandState::Ok;
                changed += 1;
            }
        }
        if changed > 0 {
            state.invalidate();
        }
        Ok(changed)
    }

    /// Capture nodes, segments and positions. Independent of cache state.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        let nodes = state
            .graph
            .all_nodes()
            .into_iter()
            .map(|n| SnapshotNode {
                id: n.id.clone(),
                kind: n.kind,
                circuit: n.circuit.clone(),
                label: n.label.clone(),
            })
            .collect();
        let edges = state
            .graph
            .all_segments()
            .into_iter()
            .map(|s| {
                SnapshotEdge::from_strands(
                    s.source,
                    s.target,
                    s.data.id.clone(),
                    s.data.circuit.clone(),
                    &s.data.strands,
                )
            })
            .collect();

        Snapshot {
            nodes,
            edges,
            node_positions: state.positions.clone(),
            timestamp: Utc::now(),
        }
    }

    /// The logical graph for the current physical state, rebuilt only when
    /// the store version moved since the cached build.
    pub fn logical_graph(&self) -> Arc<LogicalGraph> {
        let mut state = self.lock();
        self.logical_graph_of(&mut state)
    }

    fn logical_graph_of(&self, state: &mut TopologyState) -> Arc<LogicalGraph> {
        if let Some(cached) = &state.cache {
            if cached.version == state.version {
                return cached.graph.clone();
            }
        }

        let graph = Arc::new(self.builder.build(&state.graph));
        state.cache = Some(CachedGraph {
            version: state.version,
            graph: graph.clone(),
        });
        state.builds += 1;
        info!(
            "Logical graph rebuilt at version {} ({} edges)",
            state.version,
            graph.edge_count()
        );
        graph
    }

    /// Logical graph, segments and field nodes captured under one lock.
    pub fn view(&self) -> TopologyView {
        let mut state = self.lock();
        TopologyView {
            version: state.version,
            graph: self.logical_graph_of(&mut state),
            segments: self.segments_of(&state),
            field_nodes: field_nodes_of(&state),
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.lock().graph.contains_node(id)
    }

    /// Ids of all field nodes, sorted.
    pub fn field_nodes(&self) -> Vec<String> {
        field_nodes_of(&self.lock())
    }

    pub fn node_count(&self) -> usize {
        self.lock().graph.node_count()
    }

    pub fn segment_count(&self) -> usize {
        self.lock().graph.segment_count()
    }

    /// Monotonic mutation counter.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Number of logical-graph builds performed so far.
    pub fn builds(&self) -> u64 {
        self.lock().builds
    }
}

fn field_nodes_of(state: &TopologyState) -> Vec<String> {
    let mut ids: Vec<String> = state
        .graph
        .all_nodes()
        .into_iter()
        .filter(|n| n.kind == NodeKind::Field)
        .map(|n| n.id.clone())
        .collect();
    ids.sort();
    ids
}

/// `faulty` when any forward or return strand is faulty.
pub fn comm_status(roles: &StrandRoles, strands: &StrandMap) -> CommStatus {
    let faulty = [StrandRole::Forward, StrandRole::Return]
        .into_iter()
        .any(|role| !roles.faulty(role, strands).is_empty());
    if faulty {
        CommStatus::Faulty
    } else {
        CommStatus::Ok
    }
}

/// Parse raw snapshot strand values into a complete `1..=total` map.
fn normalize_strands(segment_id: &str, raw: &BTreeMap<String, String>, total: u32) -> StrandMap {
    let mut strands = healthy_strands(total);
    for (key, value) in raw {
        let idx = match key.parse::<u32>() {
            Ok(idx) if idx > 0 && idx <= total => idx,
            Ok(idx) if idx > total => {
                warn!(
                    "Segment {}: dropping strand {} outside 1..={}",
                    segment_id, idx, total
                );
                continue;
            }
            _ => {
                warn!("Segment {}: dropping strand key {:?}", segment_id, key);
                continue;
            }
        };
        let state = StrandState::from_stored(value).unwrap_or_else(|| {
            warn!(
                "Segment {}: strand {} has unknown state {:?}, reading as ok",
                segment_id, idx, value
            );
            StrandState::Ok
        });
        strands.insert(idx, state);
    }
    strands
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringwatch_core::presets::standard_plant;

    fn store() -> TopologyStore {
        let store = TopologyStore::new(Arc::new(standard_plant()));
        store.initialize(None);
        store
    }

    #[test]
    fn default_topology_shape() {
        let store = store();
        assert_eq!(store.node_count(), 23);
        // one feeder per circuit plus the chain links: 22 field nodes, 22 segments
        assert_eq!(store.segment_count(), 22);
        assert_eq!(store.field_nodes().len(), 22);
        assert!(store.contains_node("SET"));
        for seg in store.segments() {
            assert_eq!(seg.strands.len(), 16);
            assert!(seg.strands.values().all(|s| s.is_ok()));
            assert_eq!(seg.comm_status, CommStatus::Ok);
        }
    }

    #[test]
    fn segments_are_sorted_by_circuit_then_id() {
        let store = store();
        let segments = store.segments();
        assert_eq!(segments[0].id, "CT21-CT22");
        assert_eq!(segments[1].id, "SET-CT21");
        let circuits: Vec<_> = segments.iter().map(|s| s.circuit.clone().unwrap()).collect();
        let mut sorted = circuits.clone();
        sorted.sort();
        assert_eq!(circuits, sorted);
    }

    #[test]
    fn update_rejects_unknown_segment_and_strand() {
        let store = store();
        assert!(matches!(
            store.update_fiber("nowhere", 1, StrandState::Faulty),
            Err(RingError::NotFound(_))
        ));
        assert!(matches!(
            store.update_fiber("SET-CT01", 17, StrandState::Faulty),
            Err(RingError::NotFound(_))
        ));
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn update_matches_reversed_pair() {
        let store = store();
        let update = store.update_fiber("CT01-SET", 2, StrandState::Faulty).unwrap();
        assert!(update.changed());
        assert_eq!(update.segment_id, "SET-CT01");
        let seg = store.segments().into_iter().find(|s| s.id == "SET-CT01").unwrap();
        assert_eq!(seg.state(2), StrandState::Faulty);
        assert_eq!(seg.comm_status, CommStatus::Faulty);
    }

    #[test]
    fn noop_write_keeps_version() {
        let store = store();
        let before = store.version();
        let update = store.update_fiber("SET-CT01", 5, StrandState::Ok).unwrap();
        assert!(!update.changed());
        assert_eq!(store.version(), before);
    }

    #[test]
    fn restore_is_idempotent() {
        let store = store();
        store.update_fiber("SET-CT01", 1, StrandState::Faulty).unwrap();
        store.update_fiber("SET-CT01", 9, StrandState::Faulty).unwrap();
        assert_eq!(store.restore_segment("SET-CT01").unwrap(), 2);
        let version = store.version();
        assert_eq!(store.restore_segment("SET-CT01").unwrap(), 0);
        assert_eq!(store.version(), version);
        assert!(store.restore_segment("CT01-CT99").is_err());
    }

    #[test]
    fn cache_is_reused_until_mutation() {
        let store = store();
        let first = store.logical_graph();
        let second = store.logical_graph();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.builds(), 1);

        store.update_fiber("SET-CT01", 5, StrandState::Ok).unwrap();
        assert!(Arc::ptr_eq(&first, &store.logical_graph()));

        store.update_fiber("SET-CT01", 1, StrandState::Faulty).unwrap();
        let third = store.logical_graph();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(store.builds(), 2);
    }

    #[test]
    fn view_is_taken_at_one_version() {
        let store = store();
        store.update_fiber("SET-CT21", 1, StrandState::Faulty).unwrap();
        let view = store.view();
        assert_eq!(view.version, store.version());
        assert_eq!(view.field_nodes.len(), 22);
        assert!(Arc::ptr_eq(&view.graph, &store.logical_graph()));
        let seg = view.segments.iter().find(|s| s.id == "SET-CT21").unwrap();
        assert_eq!(seg.comm_status, CommStatus::Faulty);
    }

    #[test]
    fn snapshot_roundtrip_preserves_state() {
        let store = store();
        store.update_fiber("CT01-CT02", 3, StrandState::Faulty).unwrap();
        let snap = store.snapshot();
        assert_eq!(snap.nodes.len(), 23);
        assert_eq!(snap.edges.len(), 22);
        assert_eq!(snap.node_positions.len(), 23);

        let other = TopologyStore::new(Arc::new(standard_plant()));
        other.initialize(Some(&snap));
        assert_eq!(other.segments(), store.segments());
    }

    #[test]
    fn snapshot_values_are_normalized() {
        let json = r#"{
            "nodes": [{"id": "CT01", "kind": "field"}],
            "edges": [{"source": "SET", "target": "CT01",
                       "fibers": {"1": "averiado", "2": "melted", "x": "faulty", "17": "faulty"}}],
            "timestamp": "2024-05-01T10:00:00Z"
        }"#;
        let snap = Snapshot::from_json(json).unwrap();
        let store = TopologyStore::new(Arc::new(standard_plant()));
        store.initialize(Some(&snap));

        assert!(store.contains_node("SET"));
        let seg = &store.segments()[0];
        assert_eq!(seg.id, "SET-CT01");
        assert_eq!(seg.state(1), StrandState::Faulty);
        assert_eq!(seg.state(2), StrandState::Ok);
        assert_eq!(seg.state(16), StrandState::Ok);
        assert_eq!(seg.strands.len(), 16);
        assert!(!seg.strands.contains_key(&17));
    }

    #[test]
    fn strands_beyond_plant_total_are_dropped() {
        let json = r#"{
            "nodes": [{"id": "SET", "kind": "center"}, {"id": "CT01", "kind": "field"}],
            "edges": [{"source": "SET", "target": "CT01", "id": "s",
                       "fibers": {"99": "faulty", "16": "faulty"}}],
            "timestamp": "2024-05-01T10:00:00Z"
        }"#;
        let store = TopologyStore::new(Arc::new(standard_plant()));
        store.initialize(Some(&Snapshot::from_json(json).unwrap()));

        let seg = &store.segments()[0];
        assert_eq!(seg.strands.len(), 16);
        assert_eq!(seg.state(16), StrandState::Faulty);
        assert!(matches!(
            store.update_fiber("s", 99, StrandState::Ok),
            Err(RingError::NotFound(_))
        ));
    }

    #[test]
    fn snapshot_with_foreign_center_keeps_one_center() {
        let json = r#"{
            "nodes": [{"id": "HUB", "kind": "center"}, {"id": "CT01", "kind": "field"}],
            "edges": [{"source": "HUB", "target": "CT01"}],
            "timestamp": "2024-05-01T10:00:00Z"
        }"#;
        let store = TopologyStore::new(Arc::new(standard_plant()));
        store.initialize(Some(&Snapshot::from_json(json).unwrap()));

        let snapshot = store.snapshot();
        let centers: Vec<&str> = snapshot
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Center)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(centers, vec!["SET"]);
        assert_eq!(store.field_nodes(), vec!["CT01".to_string(), "HUB".to_string()]);
    }

    #[test]
    fn snapshot_edge_to_unknown_node_adds_it() {
        let json = r#"{
            "nodes": [{"id": "SET", "kind": "center"}],
            "edges": [{"source": "SET", "target": "CT77", "id": "feeder"}],
            "timestamp": "2024-05-01T10:00:00Z"
        }"#;
        let store = TopologyStore::new(Arc::new(standard_plant()));
        store.initialize(Some(&Snapshot::from_json(json).unwrap()));
        assert_eq!(store.field_nodes(), vec!["CT77".to_string()]);
        assert!(store.update_fiber("feeder", 16, StrandState::Faulty).is_ok());
    }
}
