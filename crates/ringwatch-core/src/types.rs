//! Shared types used across the topology store, the analyzers and the
//! persistence layer.

use crate::error::RingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Display or geographic position of a node.
pub type Position = [f64; 2];

/// Per-strand state, keyed by strand index (1..=N).
pub type StrandMap = BTreeMap<u32, StrandState>;

/// Operator-asserted state of a single fiber strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrandState {
    #[default]
    Ok,
    #[serde(alias = "averiado")]
    Faulty,
}

impl StrandState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrandState::Ok => "ok",
            StrandState::Faulty => "faulty",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StrandState::Ok)
    }

    /// Lenient parse used when reading stored snapshots.
    ///
    /// Accepts the legacy `averiado` spelling; anything unknown is `None`.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "ok" => Some(StrandState::Ok),
            "faulty" | "averiado" => Some(StrandState::Faulty),
            _ => None,
        }
    }
}

impl fmt::Display for StrandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse used for operator input.
impl FromStr for StrandState {
    type Err = RingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(StrandState::Ok),
            "faulty" => Ok(StrandState::Faulty),
            other => Err(RingError::invalid_state(other)),
        }
    }
}

/// Role of a site in the plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The central site feeding every circuit.
    #[serde(alias = "set")]
    Center,
    /// A field site belonging to a circuit.
    #[serde(alias = "ct")]
    Field,
}

/// A site in the physical graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NodeData {
    pub fn center(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: Some(id.clone()),
            id,
            kind: NodeKind::Center,
            circuit: None,
        }
    }

    pub fn field(id: impl Into<String>, circuit: Option<String>) -> Self {
        let id = id.into();
        Self {
            label: Some(id.clone()),
            id,
            kind: NodeKind::Field,
            circuit,
        }
    }

    pub fn is_center(&self) -> bool {
        self.kind == NodeKind::Center
    }
}

/// Payload of an undirected physical segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentData {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit: Option<String>,
    pub strands: StrandMap,
}

impl SegmentData {
    /// A segment whose strands `1..=total` are all `ok`.
    pub fn healthy(id: impl Into<String>, circuit: Option<String>, total: u32) -> Self {
        Self {
            id: id.into(),
            circuit,
            strands: healthy_strands(total),
        }
    }

    /// State of a strand; indices missing from the map read as `ok`.
    pub fn state(&self, strand: u32) -> StrandState {
        self.strands.get(&strand).copied().unwrap_or_default()
    }
}

/// Strand map with every index `1..=total` set to `ok`.
pub fn healthy_strands(total: u32) -> StrandMap {
    (1..=total).map(|i| (i, StrandState::Ok)).collect()
}

/// Communication health of a segment (any forward/return strand faulty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommStatus {
    Ok,
    Faulty,
}

impl CommStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommStatus::Ok => "ok",
            CommStatus::Faulty => "faulty",
        }
    }
}

impl fmt::Display for CommStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical per-segment record returned by the topology store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit: Option<String>,
    pub strands: StrandMap,
    pub comm_status: CommStatus,
}

impl SegmentRecord {
    pub fn state(&self, strand: u32) -> StrandState {
        self.strands.get(&strand).copied().unwrap_or_default()
    }
}

/// Bidirectional reachability of a node from the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Reachable from the center and able to reach it back.
    Connected,
    /// Exists, but at least one direction fails.
    Isolated,
    /// Configuration problem: unknown node or inconsistent graph.
    Error,
}

impl Connectivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Connected => "connected",
            Connectivity::Isolated => "isolated",
            Connectivity::Error => "error",
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
