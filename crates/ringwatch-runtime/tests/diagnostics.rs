//! End-to-end diagnostics over whole plants.

use ringwatch_core::logical::{EdgeRole, LogicalEdge, LogicalGraph, Provenance, MAX_DEPTH};
use ringwatch_core::persistence::HistoryQuery;
use ringwatch_core::plant::PlantConfig;
use ringwatch_core::presets::standard_plant;
use ringwatch_core::roles::StrandRole;
use ringwatch_core::types::{Connectivity, StrandState};
use ringwatch_runtime::advisor::{Finding, Remedy, SegmentDiagnosis};
use ringwatch_runtime::engine::DiagnosticEngine;
use ringwatch_runtime::memory_store::MemoryStore;
use std::sync::Arc;

fn standard_engine() -> DiagnosticEngine {
    DiagnosticEngine::new(standard_plant())
        .unwrap()
        .with_storage(Box::new(MemoryStore::new()))
}

/// One circuit of three sites hanging off the center.
fn single_circuit_engine() -> DiagnosticEngine {
    DiagnosticEngine::new(PlantConfig::new("spur").with_circuit("C1", ["A1", "A2", "A3"])).unwrap()
}

fn fail(engine: &DiagnosticEngine, segment: &str, strands: impl IntoIterator<Item = u32>) {
    for s in strands {
        let result = engine.set_strand(segment, s, "faulty", Some("test"));
        assert!(result.success, "{}", result);
    }
}

fn segment_findings(findings: &[Finding]) -> Vec<&SegmentDiagnosis> {
    findings
        .iter()
        .filter_map(|f| match f {
            Finding::SegmentFaults(d) => Some(d),
            _ => None,
        })
        .collect()
}

#[test]
fn default_plant_is_fully_connected_and_ring_intact() {
    let engine = standard_engine();
    let status = engine.status();

    assert_eq!(status.connectivity.len(), 22);
    assert!(status.all_connected());
    assert_eq!(status.ring.len(), 8);
    assert!(status.ring.as_map().values().all(|ok| *ok));
    assert_eq!(status.findings[0], Finding::AllConnected { count: 22 });
    assert!(status.findings.contains(&Finding::RingIntact));
    assert_eq!(status.findings.last(), Some(&Finding::VerifyPhysically));
}

#[test]
fn center_is_always_connected() {
    for plant in [
        standard_plant(),
        PlantConfig::new("spur").with_circuit("C1", ["A1"]),
        PlantConfig::new("empty"),
    ] {
        let engine = DiagnosticEngine::new(plant).unwrap();
        assert_eq!(engine.connectivity("SET"), Connectivity::Connected);
    }
}

#[test]
fn broken_link_isolates_downstream_sites() {
    let engine = standard_engine();
    fail(&engine, "CT01-CT02", 1..=4);
    let status = engine.status();

    assert_eq!(status.nodes_with(Connectivity::Isolated), vec!["CT02", "CT03"]);
    assert_eq!(status.connectivity["CT01"], Connectivity::Connected);
    assert_eq!(status.connectivity["CT09"], Connectivity::Connected);

    // The C7 -> C8 handover is restored by a patch at the center.
    let graph = engine.store().logical_graph();
    assert_eq!(graph.edge("CT03", "CT09").map(|e| e.role), Some(EdgeRole::RingPatch));
    assert!(status.ring.is_intact());

    let diagnoses = segment_findings(&status.findings);
    assert_eq!(diagnoses.len(), 1);
    assert_eq!(diagnoses[0].segment_id, "CT01-CT02");
    assert_eq!(diagnoses[0].proposed_count(), 4);
    assert_eq!(diagnoses[0].allocation(StrandRole::Forward).unwrap().proposed(), &[5, 6]);
    assert_eq!(diagnoses[0].allocation(StrandRole::Return).unwrap().proposed(), &[7, 8]);
}

#[test]
fn spur_without_alternative_is_isolated_with_proposals() {
    let engine = single_circuit_engine();
    fail(&engine, "SET-A1", 1..=4);
    let status = engine.status();

    assert_eq!(status.nodes_with(Connectivity::Isolated), vec!["A1", "A2", "A3"]);
    let diagnoses = segment_findings(&status.findings);
    assert_eq!(diagnoses.len(), 1);
    assert_eq!(diagnoses[0].proposed_count(), 4);
    assert!(!status.findings.contains(&Finding::PatchSuspected));
}

#[test]
fn insufficient_reserves_are_reported_not_proposed() {
    let engine = single_circuit_engine();
    fail(&engine, "SET-A1", 1..=4);
    fail(&engine, "SET-A1", 6..=12);
    let status = engine.status();

    let diagnoses = segment_findings(&status.findings);
    assert_eq!(diagnoses[0].proposed_count(), 0);
    for role in [StrandRole::Forward, StrandRole::Return] {
        assert_eq!(
            diagnoses[0].allocation(role).unwrap().remedy,
            Remedy::Insufficient {
                available: 1,
                needed: 2
            }
        );
    }
    let text = status.findings.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
    assert!(text.contains("reserves (1) insufficient (needs 2)"));
}

#[test]
fn set_then_clear_is_a_net_noop() {
    let engine = standard_engine();
    let before = engine.store().segments();
    assert!(engine.set_strand("CT14-CT15", 2, "faulty", None).success);
    assert!(engine.set_strand("CT14-CT15", 2, "ok", None).success);
    assert_eq!(engine.store().segments(), before);
}

#[test]
fn restore_twice_changes_nothing_the_second_time() {
    let engine = standard_engine();
    fail(&engine, "SET-CT07", [1, 5, 13]);
    assert_eq!(engine.restore_segment("SET-CT07").message, "3 strand(s) restored on SET-CT07");
    assert_eq!(engine.restore_segment("SET-CT07").message, "0 strand(s) restored on SET-CT07");
}

#[test]
fn logical_graph_is_reused_until_an_effective_change() {
    let engine = standard_engine();
    let store = engine.store();
    let first = store.logical_graph();
    let second = store.logical_graph();
    assert_eq!(*first, *second);
    assert!(Arc::ptr_eq(&first, &second));
    let builds = store.builds();

    assert!(engine.set_strand("SET-CT21", 1, "ok", None).success);
    store.logical_graph();
    assert_eq!(store.builds(), builds);

    fail(&engine, "SET-CT21", [1, 2]);
    let third = store.logical_graph();
    assert_eq!(store.builds(), builds + 1);
    assert_ne!(*first, *third);
    assert!(third.edge("SET", "CT21").is_none());
}

#[test]
fn ring_map_has_one_entry_per_circuit() {
    let plant = PlantConfig::new("three")
        .with_circuit("C1", ["A1"])
        .with_circuit("C2", ["B1", "B2"])
        .with_circuit("C3", Vec::<String>::new());
    let engine = DiagnosticEngine::new(plant).unwrap();
    let ring = engine.ring_integrity();
    assert_eq!(ring.len(), 3);
    assert!(!ring.as_map()["C2→C3"]);
    assert!(!ring.as_map()["C3→C1"]);
}

#[test]
fn isolation_without_strand_faults_points_at_patching() {
    let engine = single_circuit_engine();
    // Drop both segments touching A2: the sites beyond A1 are cut off
    // without a single faulty strand.
    let mut snapshot = engine.snapshot();
    snapshot.edges.retain(|e| !(e.source == "A2" || e.target == "A2"));
    engine.load_snapshot(&snapshot);

    let status = engine.status();
    assert_eq!(status.connectivity["A2"], Connectivity::Isolated);
    assert!(status.findings.contains(&Finding::PatchSuspected));
}

#[test]
fn cyclic_graph_beyond_depth_bound_terminates() {
    let mut graph = LogicalGraph::new();
    let n = MAX_DEPTH + 10;
    for i in 0..n {
        graph.add_node(format!("n{}", i));
    }
    for i in 0..n {
        graph.add_edge(LogicalEdge {
            from: format!("n{}", i),
            to: format!("n{}", (i + 1) % n),
            role: EdgeRole::Forward,
            provenance: Provenance::Segment {
                id: format!("s{}", i),
                circuit: None,
            },
        });
    }
    assert_eq!(graph.has_path("n0", &format!("n{}", MAX_DEPTH + 1), MAX_DEPTH), Ok(false));
    assert_eq!(graph.has_path("n0", &format!("n{}", MAX_DEPTH), MAX_DEPTH), Ok(true));
}

#[test]
fn concurrent_writers_serialize() {
    let engine = standard_engine();
    let segments: Vec<String> = engine.store().segments().into_iter().map(|s| s.id).collect();

    std::thread::scope(|scope| {
        for seg in &segments {
            let engine = &engine;
            scope.spawn(move || {
                for strand in 1..=16 {
                    assert!(engine.set_strand(seg, strand, "faulty", None).success);
                }
                engine.status();
            });
        }
    });

    let status = engine.status();
    assert!(status
        .segments
        .iter()
        .all(|s| s.strands.values().all(|v| *v == StrandState::Faulty)));
    assert_eq!(status.nodes_with(Connectivity::Isolated).len(), 22);

    let history = engine
        .strand_history(HistoryQuery::default().limit(usize::MAX))
        .unwrap();
    assert_eq!(history.len(), segments.len() * 16);
}

#[cfg(feature = "sqlite")]
#[test]
fn plant_lifecycle_over_sqlite() {
    use ringwatch_core::cctv::{CctvConfig, CctvSite};
    use ringwatch_runtime::sqlite_store::SqliteStore;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ringwatch.db");
    let mut engine = DiagnosticEngine::new(standard_plant())
        .unwrap()
        .with_storage(Box::new(SqliteStore::open(&path).unwrap()));
    engine.activate();
    fail(&engine, "SET-CT21", [1, 2]);
    assert!(engine.save_configuration("outage", false).success);
    let cctv = CctvConfig::new().with_site("CT21", CctvSite::new(2, ["B30", "B31"]));
    assert!(engine.save_cctv_config(&cctv).success);

    assert!(engine.create_plant("Sabinar II", Some("Sabinar I")).success);
    assert!(!engine.delete_plant("Sabinar I").success);

    let mut sibling = standard_plant();
    sibling.id = "Sabinar II".into();
    assert!(engine.set_active_plant(sibling).success);
    assert!(engine.delete_plant("Sabinar I").success);
    assert_eq!(engine.available_plants().unwrap(), vec!["Sabinar II".to_string()]);

    let result = engine.delete_plant("Sabinar II");
    assert!(!result.success, "{}", result);

    assert!(engine.rename_plant("Sabinar II", "Sabinar Sur").success);
    assert_eq!(engine.load_cctv_config(), cctv);
    assert!(engine.load_configuration("outage").success);
    assert_eq!(
        engine.strand_history(HistoryQuery::default()).unwrap().len(),
        0,
        "audit records stay with the plant they were logged under"
    );
}
