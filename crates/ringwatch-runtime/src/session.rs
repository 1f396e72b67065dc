//! Session files: save/load a topology snapshot as pretty JSON.
//!
//! The CLI keeps its working topology in one of these between invocations.
//! Reading is tolerant of legacy values; normalization happens when the
//! snapshot is loaded into a store.

use ringwatch_core::snapshot::Snapshot;
use std::path::Path;

/// Write a snapshot to a JSON file, creating parent directories.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> std::io::Result<()> {
    let json = snapshot
        .to_json_pretty()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, json)
}

/// Load a snapshot saved by [`save_snapshot`].
pub fn load_snapshot(path: &Path) -> std::io::Result<Snapshot> {
    let json = std::fs::read_to_string(path)?;
    Snapshot::from_json(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TopologyStore;
    use ringwatch_core::presets::standard_plant;
    use ringwatch_core::types::StrandState;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn save_load_roundtrip() {
        let store = TopologyStore::new(Arc::new(standard_plant()));
        store.initialize(None);
        store.update_fiber("CT05-CT06", 9, StrandState::Faulty).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".ringwatch").join("current.json");
        save_snapshot(&path, &store.snapshot()).unwrap();

        let restored = TopologyStore::new(Arc::new(standard_plant()));
        restored.initialize(Some(&load_snapshot(&path).unwrap()));
        assert_eq!(restored.segments(), store.segments());
    }

    #[test]
    fn garbage_is_invalid_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_snapshot(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
