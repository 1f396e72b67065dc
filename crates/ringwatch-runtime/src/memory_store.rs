//! In-memory snapshot store.
//!
//! Same semantics as the SQLite store, without a database. Used by tests
//! and by engines that run without persistent storage.

use chrono::{DateTime, Utc};
use ringwatch_core::cctv::CctvConfig;
use ringwatch_core::error::{RingError, Result};
use ringwatch_core::persistence::{HistoryQuery, SnapshotStore, StrandChange};
use ringwatch_core::snapshot::{ConfigSummary, Snapshot};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct StoredConfig {
    snapshot: Snapshot,
    is_default: bool,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    /// (plant, name) to stored configuration.
    configs: BTreeMap<(String, String), StoredConfig>,
    plants: BTreeSet<String>,
    cctv: BTreeMap<String, CctvConfig>,
    log: Vec<StrandChange>,
}

impl Inner {
    fn require_plant(&self, plant_id: &str) -> Result<()> {
        if self.plants.contains(plant_id) {
            Ok(())
        } else {
            Err(RingError::plant_not_found(plant_id))
        }
    }

    fn plant_configs(&self, plant_id: &str) -> Vec<(String, StoredConfig)> {
        self.configs
            .iter()
            .filter(|((plant, _), _)| plant == plant_id)
            .map(|((_, name), c)| (name.clone(), c.clone()))
            .collect()
    }

    fn drop_configs(&mut self, plant_id: &str) {
        self.configs.retain(|(plant, _), _| plant != plant_id);
    }
}

/// Snapshot store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plant without storing a snapshot for it.
    pub fn register_plant(&self, plant_id: &str) {
        self.lock().plants.insert(plant_id.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&self, name: &str, snapshot: &Snapshot, plant_id: &str, is_default: bool) -> Result<()> {
        let mut inner = self.lock();
        let now = Utc::now();
        if is_default {
            for ((plant, _), config) in inner.configs.iter_mut() {
                if plant == plant_id {
                    config.is_default = false;
                }
            }
        }
        let key = (plant_id.to_string(), name.to_string());
        let created = inner.configs.get(&key).map_or(now, |c| c.created);
        inner.configs.insert(
            key,
            StoredConfig {
                snapshot: snapshot.clone(),
                is_default,
                created,
                modified: now,
            },
        );
        inner.plants.insert(plant_id.to_string());
        Ok(())
    }

    fn load(&self, name: &str, plant_id: &str) -> Result<Option<Snapshot>> {
        let inner = self.lock();
        Ok(inner
            .configs
            .get(&(plant_id.to_string(), name.to_string()))
            .map(|c| c.snapshot.clone()))
    }

    fn get_default(&self, plant_id: &str) -> Result<Option<Snapshot>> {
        let inner = self.lock();
        let flagged = inner
            .configs
            .iter()
            .find(|((plant, _), c)| plant == plant_id && c.is_default)
            .map(|(_, c)| c.snapshot.clone());
        Ok(flagged.or_else(|| {
            inner
                .configs
                .get(&(plant_id.to_string(), "default".to_string()))
                .map(|c| c.snapshot.clone())
        }))
    }

    fn list(&self, plant_id: &str) -> Result<Vec<ConfigSummary>> {
        let inner = self.lock();
        Ok(inner
            .configs
            .iter()
            .filter(|((plant, _), _)| plant == plant_id)
            .map(|((_, name), c)| ConfigSummary {
                name: name.clone(),
                is_default: c.is_default,
                created: c.created,
                modified: c.modified,
            })
            .collect())
    }

    fn delete(&self, name: &str, plant_id: &str) -> Result<bool> {
        let mut inner = self.lock();
        Ok(inner
            .configs
            .remove(&(plant_id.to_string(), name.to_string()))
            .is_some())
    }

    fn plants(&self) -> Result<Vec<String>> {
        Ok(self.lock().plants.iter().cloned().collect())
    }

    fn create_plant(&self, plant_id: &str) -> Result<()> {
        if self.lock().plants.insert(plant_id.to_string()) {
            Ok(())
        } else {
            Err(RingError::plant_exists(plant_id))
        }
    }

    fn copy_configurations(&self, from: &str, to: &str) -> Result<usize> {
        let mut inner = self.lock();
        inner.require_plant(from)?;
        inner.require_plant(to)?;

        let now = Utc::now();
        let copied = inner.plant_configs(from);
        if copied.iter().any(|(_, c)| c.is_default) {
            for ((plant, _), config) in inner.configs.iter_mut() {
                if plant == to {
                    config.is_default = false;
                }
            }
        }
        let count = copied.len();
        for (name, config) in copied {
            inner.configs.insert(
                (to.to_string(), name),
                StoredConfig {
                    created: now,
                    modified: now,
                    ..config
                },
            );
        }
        if let Some(cctv) = inner.cctv.get(from).cloned() {
            inner.cctv.insert(to.to_string(), cctv);
        }
        Ok(count)
    }

    fn rename_plant(&self, old_id: &str, new_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.require_plant(old_id)?;
        if inner.plants.contains(new_id) {
            return Err(RingError::plant_exists(new_id));
        }

        let moved = inner.plant_configs(old_id);
        inner.drop_configs(old_id);
        for (name, config) in moved {
            inner.configs.insert((new_id.to_string(), name), config);
        }
        if let Some(cctv) = inner.cctv.remove(old_id) {
            inner.cctv.insert(new_id.to_string(), cctv);
        }
        inner.plants.remove(old_id);
        inner.plants.insert(new_id.to_string());
        Ok(())
    }

    fn delete_plant(&self, plant_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.require_plant(plant_id)?;
        if inner.plants.len() <= 1 {
            return Err(RingError::last_plant(plant_id));
        }
        inner.drop_configs(plant_id);
        inner.cctv.remove(plant_id);
        inner.plants.remove(plant_id);
        Ok(())
    }

    fn save_cctv_config(&self, plant_id: &str, config: &CctvConfig) -> Result<()> {
        let mut inner = self.lock();
        inner.plants.insert(plant_id.to_string());
        inner.cctv.insert(plant_id.to_string(), config.clone());
        Ok(())
    }

    fn load_cctv_config(&self, plant_id: &str) -> Result<Option<CctvConfig>> {
        Ok(self.lock().cctv.get(plant_id).cloned())
    }

    fn log_strand_change(&self, change: &StrandChange) -> Result<()> {
        self.lock().log.push(change.clone());
        Ok(())
    }

    fn strand_history(&self, query: &HistoryQuery) -> Result<Vec<StrandChange>> {
        let inner = self.lock();
        Ok(inner
            .log
            .iter()
            .rev()
            .filter(|c| query.matches(c))
            .take(query.limit)
            .cloned()
            .collect())
    }
}
