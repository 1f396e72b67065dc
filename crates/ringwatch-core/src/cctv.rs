//! Per-plant CCTV inventory: cameras and poles hanging off each field node.
//!
//! The inventory is stored next to a plant's snapshots but is not part of
//! the topology; strand diagnostics never read it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cameras and poles installed at one field node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CctvSite {
    pub cameras: u32,
    #[serde(default)]
    pub poles: Vec<String>,
}

impl CctvSite {
    pub fn new(cameras: u32, poles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            cameras,
            poles: poles.into_iter().map(Into::into).collect(),
        }
    }
}

/// Field node id to its CCTV site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CctvConfig {
    pub sites: BTreeMap<String, CctvSite>,
}

impl CctvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site(mut self, node: impl Into<String>, site: CctvSite) -> Self {
        self.sites.insert(node.into(), site);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn total_cameras(&self) -> u32 {
        self.sites.values().map(|s| s.cameras).sum()
    }

    /// Site ids that are not in `nodes`.
    pub fn unknown_sites<'a>(&'a self, nodes: &[&str]) -> Vec<&'a str> {
        self.sites
            .keys()
            .filter(|id| !nodes.contains(&id.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_a_plain_map() {
        let config = CctvConfig::new().with_site("CT01", CctvSite::new(2, ["B01", "B02"]));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["CT01"]["cameras"], 2);
        assert_eq!(value["CT01"]["poles"][1], "B02");

        let back = CctvConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn poles_default_to_empty() {
        let config = CctvConfig::from_json(r#"{"CT05": {"cameras": 1}}"#).unwrap();
        assert!(config.sites["CT05"].poles.is_empty());
        assert_eq!(config.total_cameras(), 1);
    }

    #[test]
    fn reports_sites_outside_the_plant() {
        let config = CctvConfig::new()
            .with_site("CT01", CctvSite::new(1, ["B01"]))
            .with_site("CT99", CctvSite::new(1, ["B02"]));
        assert_eq!(config.unknown_sites(&["CT01", "CT02"]), vec!["CT99"]);
    }
}
