//! Persistence collaborator: plants, their named snapshots and CCTV
//! inventory, and the strand audit trail.
//!
//! The engine consumes this trait; it never implements storage itself.
//! Implementations are called outside the topology lock, after a
//! consistent snapshot has been captured.

use crate::cctv::CctvConfig;
use crate::error::Result;
use crate::snapshot::{ConfigSummary, Snapshot};
use crate::types::StrandState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of audit records returned by a history query.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One effective strand state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrandChange {
    pub timestamp: DateTime<Utc>,
    pub plant_id: String,
    pub segment_id: String,
    pub strand: u32,
    pub old_state: StrandState,
    pub new_state: StrandState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

/// Filter for audit history queries. Results are newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub plant_id: Option<String>,
    pub segment_id: Option<String>,
    pub strand: Option<u32>,
    pub limit: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            plant_id: None,
            segment_id: None,
            strand: None,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl HistoryQuery {
    pub fn for_plant(plant_id: impl Into<String>) -> Self {
        Self {
            plant_id: Some(plant_id.into()),
            ..Self::default()
        }
    }

    pub fn segment(mut self, segment_id: impl Into<String>) -> Self {
        self.segment_id = Some(segment_id.into());
        self
    }

    pub fn strand(mut self, strand: u32) -> Self {
        self.strand = Some(strand);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether a record passes the filter (limit not applied).
    pub fn matches(&self, change: &StrandChange) -> bool {
        self.plant_id.as_ref().map_or(true, |p| *p == change.plant_id)
            && self.segment_id.as_ref().map_or(true, |s| *s == change.segment_id)
            && self.strand.map_or(true, |n| n == change.strand)
    }
}

/// Storage for named snapshots per plant plus an append-only audit log.
///
/// Saving a snapshot for an unknown plant registers that plant. The audit
/// log is never rewritten by plant management: records keep the plant id
/// they were logged under.
pub trait SnapshotStore: Send + Sync {
    /// Store `snapshot` under `name`, replacing any previous one.
    /// When `is_default` is set, it becomes the plant's only default.
    fn save(&self, name: &str, snapshot: &Snapshot, plant_id: &str, is_default: bool) -> Result<()>;

    /// Load a named snapshot.
    fn load(&self, name: &str, plant_id: &str) -> Result<Option<Snapshot>>;

    /// Load the plant's default snapshot.
    fn get_default(&self, plant_id: &str) -> Result<Option<Snapshot>>;

    /// List the plant's stored snapshots.
    fn list(&self, plant_id: &str) -> Result<Vec<ConfigSummary>>;

    /// Delete a named snapshot. Returns whether one existed.
    fn delete(&self, name: &str, plant_id: &str) -> Result<bool>;

    /// Plants that have at least one stored snapshot or were registered.
    fn plants(&self) -> Result<Vec<String>>;

    /// Register a new, empty plant. Fails when it already exists.
    fn create_plant(&self, plant_id: &str) -> Result<()>;

    /// Copy every snapshot of `from` onto `to`, replacing same-named ones,
    /// together with the CCTV inventory. Both plants must exist.
    /// Returns the number of snapshots copied.
    fn copy_configurations(&self, from: &str, to: &str) -> Result<usize>;

    /// Move a plant, its snapshots and its CCTV inventory to a new id.
    fn rename_plant(&self, old_id: &str, new_id: &str) -> Result<()>;

    /// Remove a plant with its snapshots and CCTV inventory. The last
    /// remaining plant cannot be deleted.
    fn delete_plant(&self, plant_id: &str) -> Result<()>;

    /// Store the plant's CCTV inventory, replacing the previous one.
    fn save_cctv_config(&self, plant_id: &str, config: &CctvConfig) -> Result<()>;

    /// The plant's stored CCTV inventory, if any.
    fn load_cctv_config(&self, plant_id: &str) -> Result<Option<CctvConfig>>;

    /// Append an audit record.
    fn log_strand_change(&self, change: &StrandChange) -> Result<()>;

    /// Query the audit log, newest first.
    fn strand_history(&self, query: &HistoryQuery) -> Result<Vec<StrandChange>>;
}
