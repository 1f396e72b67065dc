//! # Ringwatch
//!
//! Topology and diagnostic engine for ring-shaped fiber-optic plants.
//!
//! A central site feeds several circuits, each a chain of field sites.
//! Every physical segment carries a fixed bundle of strands split into
//! forward, return, reserve and auxiliary roles. From operator-asserted
//! strand states ringwatch derives a directed logical graph and answers:
//! which sites still reach the center in both directions, whether the ring
//! handovers between circuits hold, and which reserve strands could replace
//! the failed ones.
//!
//! ## Quick Start
//!
//! ```rust
//! use ringwatch::prelude::*;
//!
//! let engine = DiagnosticEngine::new(standard_plant()).unwrap();
//!
//! // Cut every comms strand between CT01 and CT02
//! for strand in 1..=4 {
//!     engine.set_strand("CT01-CT02", strand, "faulty", Some("field crew"));
//! }
//!
//! let status = engine.status();
//! assert_eq!(status.connectivity["CT02"], Connectivity::Isolated);
//! for finding in &status.findings {
//!     println!("{}", finding);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`ringwatch_core`] - strand and node types, plant configuration,
//!   snapshot wire shape, logical graph traversal, collaborator traits
//! - [`ringwatch_runtime`] - topology store, logical-graph builder,
//!   analyzers, diagnostic engine, snapshot stores, reports
//!
//! ## Persistence
//!
//! Named snapshots and the strand audit trail go through a
//! [`SnapshotStore`](ringwatch_core::persistence::SnapshotStore).
//! [`MemoryStore`](ringwatch_runtime::memory_store::MemoryStore) is always
//! available; the `sqlite` feature adds a SQLite-backed store.
//!
//! ```rust
//! use ringwatch::prelude::*;
//!
//! let engine = DiagnosticEngine::new(standard_plant())
//!     .unwrap()
//!     .with_storage(Box::new(MemoryStore::new()));
//!
//! assert_eq!(engine.activate(), Activation::Created { saved: true });
//! assert!(engine.save_configuration("before-maintenance", false).success);
//! assert_eq!(engine.list_configurations().unwrap().len(), 2);
//! ```

// Re-export all subcrates
pub use ringwatch_core as core;
pub use ringwatch_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use ringwatch::prelude::*;
/// ```
pub mod prelude {
    pub use ringwatch_runtime::prelude::*;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
