//! Ringwatch Core Prelude: convenient imports for common usage.
//!
//! ```rust
//! use ringwatch_core::prelude::*;
//! ```

pub use crate::types::{
    CommStatus, Connectivity, NodeData, NodeKind, Position, SegmentData, SegmentRecord,
    StrandMap, StrandState,
};

pub use crate::roles::{StrandRole, StrandRoles};

pub use crate::plant::PlantConfig;
pub use crate::presets::{standard_cctv, standard_plant, STANDARD_PLANT_ID};

pub use crate::cctv::{CctvConfig, CctvSite};

pub use crate::snapshot::{ConfigSummary, Snapshot, SnapshotEdge, SnapshotNode};

pub use crate::logical::{EdgeRole, LogicalEdge, LogicalGraph, Provenance, MAX_DEPTH};

// Re-export the PhysicalGraph trait
pub use crate::topology::{PhysicalGraph, SegmentView};

// Re-export the persistence collaborator
pub use crate::persistence::{HistoryQuery, SnapshotStore, StrandChange};

// Re-export error types
pub use crate::error::{RingError, Result, TraversalFault};
