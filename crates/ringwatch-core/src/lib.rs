//! # Ringwatch Core
//!
//! Core types and traits for diagnosing ring-shaped fiber-optic plants.
//!
//! A plant is a central site (the center) feeding chains of field sites
//! (circuits). Every physical segment carries a bundle of strands whose
//! roles are fixed per plant:
//!
//! - **forward** - communications, center-outward
//! - **return** - communications, back to the center
//! - **reserve** - spare strands that can substitute failed ones
//! - **auxiliary** - video and other auxiliary traffic
//!
//! This crate defines the shared vocabulary: strand and node types, the
//! plant configuration, the snapshot wire shape, the directed
//! [`logical::LogicalGraph`] with its bounded traversal, and the
//! [`topology::PhysicalGraph`] and [`persistence::SnapshotStore`] traits.
//!
//! ## Quick Start
//!
//! ```rust
//! use ringwatch_core::prelude::*;
//!
//! let plant = standard_plant();
//! assert!(plant.validate().is_ok());
//! assert_eq!("faulty".parse::<StrandState>().unwrap(), StrandState::Faulty);
//! ```

pub mod cctv;
pub mod error;
pub mod logical;
pub mod persistence;
pub mod plant;
pub mod presets;
pub mod roles;
pub mod snapshot;
pub mod topology;
pub mod types;
pub mod prelude;
