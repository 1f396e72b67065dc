//! Plant configuration: circuits, ring order and strand roles.
//!
//! A plant is injected into the engine when it is activated; the engine
//! itself carries no knowledge of any particular layout.

use crate::error::{RingError, Result};
use crate::roles::StrandRoles;
use crate::types::Position;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

fn default_center() -> String {
    "SET".to_string()
}

/// Read-only description of a plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantConfig {
    /// Plant identifier used by the persistence collaborator.
    pub id: String,
    /// Identifier of the central site.
    #[serde(default = "default_center")]
    pub center: String,
    /// Circuit name to the ordered chain of field sites it feeds.
    #[serde(default)]
    pub circuits: BTreeMap<String, Vec<String>>,
    /// Cyclic order in which circuits are patched at the center.
    #[serde(default)]
    pub ring_order: Vec<String>,
    #[serde(default)]
    pub roles: StrandRoles,
    #[serde(default)]
    pub positions: BTreeMap<String, Position>,
}

impl PlantConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            center: default_center(),
            circuits: BTreeMap::new(),
            ring_order: Vec::new(),
            roles: StrandRoles::default(),
            positions: BTreeMap::new(),
        }
    }

    /// Add a circuit and append it to the ring order.
    pub fn with_circuit<I, S>(mut self, name: impl Into<String>, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        self.ring_order.push(name.clone());
        self.circuits
            .insert(name, nodes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_roles(mut self, roles: StrandRoles) -> Self {
        self.roles = roles;
        self
    }

    /// Field sites of a circuit; empty if the circuit is unknown.
    pub fn circuit(&self, name: &str) -> &[String] {
        self.circuits.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Consecutive `(circuit, next circuit)` pairs of the ring, wrapping.
    pub fn ring_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        let n = self.ring_order.len();
        (0..n).map(move |i| {
            (
                self.ring_order[i].as_str(),
                self.ring_order[(i + 1) % n].as_str(),
            )
        })
    }

    /// All field ids in circuit order, without duplicates.
    pub fn field_ids(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.circuits
            .values()
            .flatten()
            .filter(|id| seen.insert(id.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(RingError::invalid_config("plant id must not be empty"));
        }
        if self.center.trim().is_empty() {
            return Err(RingError::invalid_config("center id must not be empty"));
        }
        self.roles.validate()?;

        let mut ring_seen = BTreeSet::new();
        for name in &self.ring_order {
            if !self.circuits.contains_key(name) {
                return Err(RingError::invalid_config(format!(
                    "ring order references unknown circuit {}",
                    name
                )));
            }
            if !ring_seen.insert(name.as_str()) {
                return Err(RingError::invalid_config(format!(
                    "circuit {} appears twice in ring order",
                    name
                )));
            }
        }

        let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
        for (circuit, nodes) in &self.circuits {
            for node in nodes {
                if node == &self.center {
                    return Err(RingError::invalid_config(format!(
                        "circuit {} lists the center {}",
                        circuit, node
                    )));
                }
                if let Some(previous) = owner.insert(node.as_str(), circuit.as_str()) {
                    warn!(
                        "Field node {} appears in circuits {} and {}",
                        node, previous, circuit
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> PlantConfig {
        PlantConfig::new("test")
            .with_circuit("C1", ["A1", "A2"])
            .with_circuit("C2", ["B1"])
    }

    #[test]
    fn ring_pairs_wrap_around() {
        let plant = small();
        let pairs: Vec<_> = plant.ring_pairs().collect();
        assert_eq!(pairs, vec![("C1", "C2"), ("C2", "C1")]);
    }

    #[test]
    fn validate_accepts_small_plant() {
        small().validate().unwrap();
    }

    #[test]
    fn validate_rejects_unknown_ring_circuit() {
        let mut plant = small();
        plant.ring_order.push("C9".into());
        assert!(plant.validate().is_err());
    }

    #[test]
    fn validate_rejects_repeated_ring_circuit() {
        let mut plant = small();
        plant.ring_order.push("C1".into());
        assert!(plant.validate().is_err());
    }

    #[test]
    fn validate_rejects_center_in_circuit() {
        let plant = PlantConfig::new("bad").with_circuit("C1", ["SET"]);
        assert!(plant.validate().is_err());
    }

    #[test]
    fn shared_field_node_is_accepted() {
        let plant = small().with_circuit("C3", ["A2", "D1"]);
        plant.validate().unwrap();
        assert_eq!(plant.field_ids(), vec!["A1", "A2", "B1", "D1"]);
    }

    #[test]
    fn parses_from_json_with_defaults() {
        let plant: PlantConfig = serde_json::from_str(
            r#"{"id": "p", "circuits": {"C1": ["X"]}, "ring_order": ["C1"]}"#,
        )
        .unwrap();
        assert_eq!(plant.center, "SET");
        assert_eq!(plant.roles.total, 16);
    }
}
