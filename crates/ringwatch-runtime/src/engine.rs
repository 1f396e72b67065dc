//! Diagnostic engine: the API surface clients talk to.
//!
//! Owns one plant's topology store and an optional persistence
//! collaborator. Mutations and persistence calls report their outcome as an
//! [`ActionResult`] instead of failing across the API boundary. Snapshots
//! are captured under the topology lock; collaborator calls happen after
//! the lock has been released.

use crate::advisor::{DiagnosticAdvisor, Finding};
use crate::builder::LogicalGraphBuilder;
use crate::connectivity::ConnectivityAnalyzer;
use crate::ring::{RingIntegrity, RingIntegrityChecker};
use crate::stats::StrandStatistics;
use crate::store::TopologyStore;
use chrono::{DateTime, Utc};
use ringwatch_core::cctv::CctvConfig;
use ringwatch_core::error::{RingError, Result};
use ringwatch_core::logical::MAX_DEPTH;
use ringwatch_core::persistence::{HistoryQuery, SnapshotStore, StrandChange};
use ringwatch_core::plant::PlantConfig;
use ringwatch_core::presets::standard_cctv;
use ringwatch_core::snapshot::{ConfigSummary, Snapshot};
use ringwatch_core::types::{Connectivity, SegmentRecord, StrandState};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Name under which activation stores a freshly built topology.
pub const DEFAULT_CONFIG_NAME: &str = "default";

/// Outcome of a mutation or persistence call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<RingError> for ActionResult {
    fn from(err: RingError) -> Self {
        ActionResult::failed(err.to_string())
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where an activated topology came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Loaded from the plant's stored default snapshot.
    Restored,
    /// Built from the plant configuration; `saved` tells whether it was
    /// stored as the new default.
    Created { saved: bool },
    /// Storage failed; the plant runs on its configured topology.
    Degraded(String),
}

/// Full network status report.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkStatus {
    pub plant_id: String,
    pub generated: DateTime<Utc>,
    /// Field node id to connectivity.
    #[serde(rename = "ct_connectivity")]
    pub connectivity: BTreeMap<String, Connectivity>,
    #[serde(rename = "segment_statuses")]
    pub segments: Vec<SegmentRecord>,
    pub ring: RingIntegrity,
    pub findings: Vec<Finding>,
}

impl NetworkStatus {
    /// Field nodes with the given status, sorted.
    pub fn nodes_with(&self, status: Connectivity) -> Vec<&str> {
        self.connectivity
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn all_connected(&self) -> bool {
        self.connectivity.values().all(|s| *s == Connectivity::Connected)
    }
}

/// Diagnostic engine for one plant.
pub struct DiagnosticEngine {
    plant: Arc<PlantConfig>,
    store: TopologyStore,
    storage: Option<Box<dyn SnapshotStore>>,
    max_depth: usize,
}

impl DiagnosticEngine {
    /// Validate `plant` and build its configured topology.
    pub fn new(plant: PlantConfig) -> Result<Self> {
        plant.validate()?;
        let plant = Arc::new(plant);
        let store = TopologyStore::new(plant.clone());
        store.initialize(None);
        Ok(Self {
            plant,
            store,
            storage: None,
            max_depth: MAX_DEPTH,
        })
    }

    /// Attach a persistence collaborator.
    pub fn with_storage(mut self, storage: Box<dyn SnapshotStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Change the traversal depth cap for every reachability query.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        let snapshot = self.store.snapshot();
        self.rebind(self.plant.clone(), Some(&snapshot));
        self
    }

    /// Point the engine at `plant` with a fresh topology store.
    fn rebind(&mut self, plant: Arc<PlantConfig>, snapshot: Option<&Snapshot>) {
        self.store = TopologyStore::new(plant.clone())
            .with_builder(LogicalGraphBuilder::new(plant.clone()).with_max_depth(self.max_depth));
        self.store.initialize(snapshot);
        self.plant = plant;
    }

    pub fn plant(&self) -> &PlantConfig {
        &self.plant
    }

    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    fn storage(&self) -> Result<&dyn SnapshotStore> {
        self.storage
            .as_deref()
            .ok_or_else(|| RingError::storage("no snapshot storage attached"))
    }

    /// (Re)initialize the topology for this plant.
    ///
    /// Uses the stored default snapshot when there is one; otherwise builds
    /// the configured topology and stores it as the plant's default.
    pub fn activate(&self) -> Activation {
        let plant_id = &self.plant.id;
        let Some(storage) = self.storage.as_deref() else {
            self.store.initialize(None);
            return Activation::Created { saved: false };
        };

        match storage.get_default(plant_id) {
            Ok(Some(snapshot)) => {
                self.store.initialize(Some(&snapshot));
                info!("Plant {} activated from its default snapshot", plant_id);
                Activation::Restored
            }
            Ok(None) => {
                self.store.initialize(None);
                let snapshot = self.store.snapshot();
                match storage.save(DEFAULT_CONFIG_NAME, &snapshot, plant_id, true) {
                    Ok(()) => {
                        info!("Plant {} activated with a new default snapshot", plant_id);
                        Activation::Created { saved: true }
                    }
                    Err(e) => {
                        warn!("Could not store default snapshot for {}: {}", plant_id, e);
                        Activation::Degraded(e.to_string())
                    }
                }
            }
            Err(e) => {
                warn!("Storage unavailable while activating {}: {}", plant_id, e);
                self.store.initialize(None);
                Activation::Degraded(e.to_string())
            }
        }
    }

    /// Connectivity of every field node, segment records, ring state and findings.
    pub fn status(&self) -> NetworkStatus {
        let view = self.store.view();
        let analyzer =
            ConnectivityAnalyzer::new(&view.graph, &self.plant.center).with_max_depth(self.max_depth);
        let connectivity = analyzer.statuses(&view.field_nodes);
        let ring = RingIntegrityChecker::new(&view.graph, &self.plant)
            .with_max_depth(self.max_depth)
            .check();
        let findings =
            DiagnosticAdvisor::new(&self.plant.roles).advise(&connectivity, &view.segments, &ring);

        NetworkStatus {
            plant_id: self.plant.id.clone(),
            generated: Utc::now(),
            connectivity,
            segments: view.segments,
            ring,
            findings,
        }
    }

    /// Connectivity of one node.
    pub fn connectivity(&self, node: &str) -> Connectivity {
        if node == self.plant.center {
            return Connectivity::Connected;
        }
        // The logical graph carries every physical node, so one read answers
        // both membership and reachability at the same version.
        let graph = self.store.logical_graph();
        ConnectivityAnalyzer::new(&graph, &self.plant.center)
            .with_max_depth(self.max_depth)
            .status(node)
    }

    pub fn ring_integrity(&self) -> RingIntegrity {
        let graph = self.store.logical_graph();
        RingIntegrityChecker::new(&graph, &self.plant)
            .with_max_depth(self.max_depth)
            .check()
    }

    /// Set one strand to `"ok"` or `"faulty"` and record the change.
    ///
    /// A write that does not change the state succeeds without touching the
    /// audit trail. A failing audit write does not undo the change.
    pub fn set_strand(&self, segment_id: &str, strand: u32, state: &str, actor: Option<&str>) -> ActionResult {
        let new_state = match state.parse::<StrandState>() {
            Ok(s) => s,
            Err(e) => return e.into(),
        };
        let update = match self.store.update_fiber(segment_id, strand, new_state) {
            Ok(u) => u,
            Err(e) => return e.into(),
        };
        if !update.changed() {
            return ActionResult::ok(format!(
                "Strand {} on {} was already {}",
                strand, update.segment_id, new_state
            ));
        }

        info!(
            "Strand {} on {}: {} -> {}",
            strand, update.segment_id, update.old_state, update.new_state
        );
        let mut message = format!("Strand {} on {} set to {}", strand, update.segment_id, new_state);

        if let Some(storage) = self.storage.as_deref() {
            let change = StrandChange {
                timestamp: Utc::now(),
                plant_id: self.plant.id.clone(),
                segment_id: update.segment_id.clone(),
                strand,
                old_state: update.old_state,
                new_state: update.new_state,
                actor: actor.map(str::to_string),
            };
            if let Err(e) = storage.log_strand_change(&change) {
                warn!("Audit write for {} strand {} failed: {}", update.segment_id, strand, e);
                message.push_str(&format!(" (audit log not written: {})", e));
            }
        }
        ActionResult::ok(message)
    }

    /// Set every faulty strand of a segment back to `ok`.
    pub fn restore_segment(&self, segment_id: &str) -> ActionResult {
        match self.store.restore_segment(segment_id) {
            Ok(changed) => {
                if changed > 0 {
                    info!("Restored {} strand(s) on {}", changed, segment_id);
                }
                ActionResult::ok(format!("{} strand(s) restored on {}", changed, segment_id))
            }
            Err(e) => e.into(),
        }
    }

    pub fn strand_statistics(&self, segments: &[SegmentRecord]) -> StrandStatistics {
        StrandStatistics::compute(&self.plant.roles, segments)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Replace the working topology with `snapshot`.
    pub fn load_snapshot(&self, snapshot: &Snapshot) {
        self.store.initialize(Some(snapshot));
    }

    /// Replace the working topology with the configured one.
    pub fn reset(&self) {
        self.store.initialize(None);
    }

    /// Store the current topology under `name`.
    pub fn save_configuration(&self, name: &str, is_default: bool) -> ActionResult {
        let snapshot = self.store.snapshot();
        let result = self
            .storage()
            .and_then(|s| s.save(name, &snapshot, &self.plant.id, is_default));
        match result {
            Ok(()) => ActionResult::ok(format!(
                "Configuration '{}' saved for plant '{}'",
                name, self.plant.id
            )),
            Err(e) => e.into(),
        }
    }

    /// Replace the topology with a stored configuration. On failure the
    /// topology is left untouched.
    pub fn load_configuration(&self, name: &str) -> ActionResult {
        let loaded = self.storage().and_then(|s| s.load(name, &self.plant.id));
        match loaded {
            Ok(Some(snapshot)) => {
                self.store.initialize(Some(&snapshot));
                ActionResult::ok(format!(
                    "Configuration '{}' loaded for plant '{}'",
                    name, self.plant.id
                ))
            }
            Ok(None) => ActionResult::failed(format!(
                "Configuration '{}' not found for plant '{}'",
                name, self.plant.id
            )),
            Err(e) => e.into(),
        }
    }

    pub fn delete_configuration(&self, name: &str) -> ActionResult {
        match self.storage().and_then(|s| s.delete(name, &self.plant.id)) {
            Ok(true) => ActionResult::ok(format!("Configuration '{}' deleted", name)),
            Ok(false) => ActionResult::failed(format!("Configuration '{}' not found", name)),
            Err(e) => e.into(),
        }
    }

    /// Stored configurations of this plant; empty without storage.
    pub fn list_configurations(&self) -> Result<Vec<ConfigSummary>> {
        match self.storage.as_deref() {
            Some(storage) => storage.list(&self.plant.id),
            None => Ok(Vec::new()),
        }
    }

    /// Plants known to storage; just the active one without storage.
    pub fn available_plants(&self) -> Result<Vec<String>> {
        match self.storage.as_deref() {
            Some(storage) => storage.plants(),
            None => Ok(vec![self.plant.id.clone()]),
        }
    }

    /// Register a new plant in storage.
    ///
    /// With `base`, the base plant's snapshots and CCTV inventory are copied
    /// over. Without it the plant starts empty and receives its default
    /// snapshot when it is first activated.
    pub fn create_plant(&self, plant_id: &str, base: Option<&str>) -> ActionResult {
        let result = self.storage().and_then(|storage| {
            if let Some(base) = base {
                require_plant(storage, base)?;
            }
            storage.create_plant(plant_id)?;
            match base {
                Some(base) => storage
                    .copy_configurations(base, plant_id)
                    .map(|copied| Some((base, copied))),
                None => Ok(None),
            }
        });
        match result {
            Ok(Some((base, copied))) => {
                info!("Plant {} created from {} ({} snapshots)", plant_id, base, copied);
                ActionResult::ok(format!(
                    "Plant '{}' created from '{}' ({} configuration(s) copied)",
                    plant_id, base, copied
                ))
            }
            Ok(None) => {
                info!("Plant {} created", plant_id);
                ActionResult::ok(format!("Plant '{}' created", plant_id))
            }
            Err(e) => e.into(),
        }
    }

    /// Rename a stored plant. Renaming the active plant keeps the working
    /// topology and rebinds the engine to the new id.
    pub fn rename_plant(&mut self, old_id: &str, new_id: &str) -> ActionResult {
        if let Err(e) = self.storage().and_then(|s| s.rename_plant(old_id, new_id)) {
            return e.into();
        }
        if old_id == self.plant.id {
            let snapshot = self.store.snapshot();
            let mut plant = (*self.plant).clone();
            plant.id = new_id.to_string();
            self.rebind(Arc::new(plant), Some(&snapshot));
        }
        info!("Plant {} renamed to {}", old_id, new_id);
        ActionResult::ok(format!("Plant '{}' renamed to '{}'", old_id, new_id))
    }

    /// Delete a stored plant. Neither the active plant nor the last plant
    /// can be deleted.
    pub fn delete_plant(&self, plant_id: &str) -> ActionResult {
        if plant_id == self.plant.id {
            return ActionResult::failed(format!(
                "Plant '{}' is active and cannot be deleted",
                plant_id
            ));
        }
        match self.storage().and_then(|s| s.delete_plant(plant_id)) {
            Ok(()) => {
                info!("Plant {} deleted", plant_id);
                ActionResult::ok(format!("Plant '{}' deleted", plant_id))
            }
            Err(e) => e.into(),
        }
    }

    /// Switch the engine to another stored plant and activate it.
    ///
    /// With storage attached the plant must already exist there. On
    /// failure the engine stays on its current plant.
    pub fn set_active_plant(&mut self, plant: PlantConfig) -> ActionResult {
        if plant.id == self.plant.id {
            return ActionResult::ok(format!("Plant '{}' is already active", plant.id));
        }
        if let Err(e) = plant.validate() {
            return e.into();
        }
        if let Some(storage) = self.storage.as_deref() {
            if let Err(e) = require_plant(storage, &plant.id) {
                return e.into();
            }
        }

        let previous = self.plant.id.clone();
        self.rebind(Arc::new(plant), None);
        let message = match self.activate() {
            Activation::Restored => format!("Plant '{}' activated from its default snapshot", self.plant.id),
            Activation::Created { .. } => format!("Plant '{}' activated", self.plant.id),
            Activation::Degraded(reason) => format!(
                "Plant '{}' activated on its configured topology ({})",
                self.plant.id, reason
            ),
        };
        info!("Active plant switched from {} to {}", previous, self.plant.id);
        ActionResult::ok(message)
    }

    /// Store the active plant's CCTV inventory. Sites that are not field
    /// nodes of the plant are kept but logged.
    pub fn save_cctv_config(&self, config: &CctvConfig) -> ActionResult {
        let unknown = config.unknown_sites(&self.plant.field_ids());
        if !unknown.is_empty() {
            warn!("CCTV sites outside plant {}: {}", self.plant.id, unknown.join(", "));
        }
        match self.storage().and_then(|s| s.save_cctv_config(&self.plant.id, config)) {
            Ok(()) => ActionResult::ok(format!("CCTV configuration saved for plant '{}'", self.plant.id)),
            Err(e) => e.into(),
        }
    }

    /// The active plant's CCTV inventory: the stored one, else the bundled
    /// inventory for this plant id.
    pub fn load_cctv_config(&self) -> CctvConfig {
        let stored = self
            .storage
            .as_deref()
            .map(|s| s.load_cctv_config(&self.plant.id))
            .transpose();
        match stored {
            Ok(Some(Some(config))) => config,
            Ok(_) => standard_cctv(&self.plant.id),
            Err(e) => {
                warn!("Could not read CCTV configuration for {}: {}", self.plant.id, e);
                standard_cctv(&self.plant.id)
            }
        }
    }

    /// Audit records, newest first. Queries without a plant are scoped to this one.
    pub fn strand_history(&self, mut query: HistoryQuery) -> Result<Vec<StrandChange>> {
        if query.plant_id.is_none() {
            query.plant_id = Some(self.plant.id.clone());
        }
        self.storage()?.strand_history(&query)
    }
}

fn require_plant(storage: &dyn SnapshotStore, plant_id: &str) -> Result<()> {
    if storage.plants()?.iter().any(|p| p == plant_id) {
        Ok(())
    } else {
        Err(RingError::plant_not_found(plant_id))
    }
}
