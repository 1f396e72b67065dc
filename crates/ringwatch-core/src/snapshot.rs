//! Snapshot wire shape.
//!
//! A snapshot captures every node, every segment with its strand states,
//! and the node display positions. Snapshots are immutable once captured.
//! Strand values are kept as raw strings so that legacy or damaged data can
//! be normalized when a topology is initialized from it.

use crate::types::{NodeKind, Position, StrandMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A captured topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
    #[serde(default)]
    pub node_positions: BTreeMap<String, Position>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Serializable node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: String,
    #[serde(alias = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Serializable segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit: Option<String>,
    /// Strand index (as a string key) to raw state value.
    #[serde(default)]
    pub fibers: BTreeMap<String, String>,
}

impl SnapshotEdge {
    pub fn from_strands(
        source: impl Into<String>,
        target: impl Into<String>,
        id: impl Into<String>,
        circuit: Option<String>,
        strands: &StrandMap,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            id: Some(id.into()),
            circuit,
            fibers: strands
                .iter()
                .map(|(idx, state)| (idx.to_string(), state.as_str().to_string()))
                .collect(),
        }
    }
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_positions: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Listing entry for a stored snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub name: String,
    pub is_default: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}
