//! # Ringwatch Runtime
//!
//! Topology store, logical-graph builder and diagnostic engine.
//!
//! The runtime owns a plant's physical graph behind one lock, derives the
//! directed logical graph from strand states (memoized per store version),
//! and answers connectivity, ring-integrity and advisory queries over it.
//! Persistence is pluggable through [`ringwatch_core::persistence::SnapshotStore`].

pub mod topology_impl;
pub mod builder;
pub mod store;
pub mod connectivity;
pub mod ring;
pub mod advisor;
pub mod stats;
pub mod engine;
pub mod report;
pub mod session;
pub mod memory_store;
#[cfg(feature = "sqlite")]
pub mod sqlite_store;
pub mod prelude;
