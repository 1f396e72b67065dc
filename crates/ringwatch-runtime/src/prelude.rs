//! Ringwatch Runtime Prelude: convenient imports for common usage.
//!
//! ```rust
//! use ringwatch_runtime::prelude::*;
//! ```

// Re-export the engine
pub use crate::engine::{ActionResult, Activation, DiagnosticEngine, NetworkStatus, DEFAULT_CONFIG_NAME};

// Re-export the store and builder
pub use crate::builder::LogicalGraphBuilder;
pub use crate::store::{FiberUpdate, TopologyStore, TopologyView};
pub use crate::topology_impl::PetPhysicalGraph;

// Re-export analyzers
pub use crate::advisor::{Allocation, DiagnosticAdvisor, Finding, Remedy, SegmentDiagnosis};
pub use crate::connectivity::ConnectivityAnalyzer;
pub use crate::ring::{RingIntegrity, RingIntegrityChecker, RingLink};
pub use crate::stats::StrandStatistics;

// Re-export session files and reports
pub use crate::report::{export_report, render_report};
pub use crate::session::{load_snapshot, save_snapshot};

// Re-export snapshot stores
pub use crate::memory_store::MemoryStore;

// Re-export SQLite store when feature is enabled
#[cfg(feature = "sqlite")]
pub use crate::sqlite_store::SqliteStore;

// Re-export from core
pub use ringwatch_core::prelude::*;
