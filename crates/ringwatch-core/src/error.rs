//! Error types for ringwatch operations.
//!
//! Mutation and persistence failures are returned as values; traversal
//! faults are caught per node by the connectivity analyzer and never abort
//! a full status computation.

use thiserror::Error;

/// Result type for ringwatch operations.
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors that can occur while operating on a plant topology.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RingError {
    /// Malformed input (unknown target state, bad strand index, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced segment, strand or node is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The reachability computation met an inconsistent graph.
    #[error("traversal fault: {0}")]
    Traversal(#[from] TraversalFault),

    /// The persistence collaborator failed.
    #[error("storage error: {0}")]
    Collaborator(String),

    /// Invalid plant configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Faults raised by the bounded traversal over a logical graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalFault {
    /// The traversal started from a node the graph does not know.
    #[error("unknown node {0}")]
    UnknownNode(String),

    /// An edge points at a node that is not part of the graph.
    #[error("dangling edge {from} -> {to}")]
    DanglingEdge { from: String, to: String },
}

impl From<serde_json::Error> for RingError {
    fn from(e: serde_json::Error) -> Self {
        RingError::Serialization(e.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for RingError {
    fn from(e: rusqlite::Error) -> Self {
        RingError::Collaborator(e.to_string())
    }
}

// Convenience constructors
impl RingError {
    pub fn segment_not_found(id: impl AsRef<str>) -> Self {
        RingError::NotFound(format!("segment {} not found", id.as_ref()))
    }

    pub fn strand_not_found(segment: impl AsRef<str>, strand: u32) -> Self {
        RingError::NotFound(format!(
            "strand {} not found in segment {}",
            strand,
            segment.as_ref()
        ))
    }

    pub fn node_not_found(id: impl AsRef<str>) -> Self {
        RingError::NotFound(format!("node {} not found", id.as_ref()))
    }

    pub fn plant_not_found(id: impl AsRef<str>) -> Self {
        RingError::NotFound(format!("plant '{}' not found", id.as_ref()))
    }

    pub fn plant_exists(id: impl AsRef<str>) -> Self {
        RingError::Validation(format!("plant '{}' already exists", id.as_ref()))
    }

    pub fn last_plant(id: impl AsRef<str>) -> Self {
        RingError::Validation(format!(
            "plant '{}' is the last plant and cannot be deleted",
            id.as_ref()
        ))
    }

    pub fn invalid_state(value: impl AsRef<str>) -> Self {
        RingError::Validation(format!(
            "state '{}' is not valid (expected 'ok' or 'faulty')",
            value.as_ref()
        ))
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        RingError::Config(reason.into())
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        RingError::Collaborator(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_fault_converts() {
        let err: RingError = TraversalFault::UnknownNode("CT99".into()).into();
        assert_eq!(err.to_string(), "traversal fault: unknown node CT99");
    }

    #[test]
    fn constructors_format_messages() {
        assert_eq!(
            RingError::strand_not_found("SET-CT01", 17).to_string(),
            "not found: strand 17 not found in segment SET-CT01"
        );
        assert!(matches!(RingError::invalid_state("broken"), RingError::Validation(_)));
    }
}
