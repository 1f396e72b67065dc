//! SQLite-backed implementation of the SnapshotStore trait.
//!
//! Named snapshots and CCTV inventories are stored as JSON documents per
//! plant, next to an append-only strand status log. Supports both in-memory and file-backed
//! databases.

#![cfg(feature = "sqlite")]

use chrono::{DateTime, Utc};
use ringwatch_core::cctv::CctvConfig;
use ringwatch_core::error::{RingError, Result};
use ringwatch_core::persistence::{HistoryQuery, SnapshotStore, StrandChange};
use ringwatch_core::snapshot::{ConfigSummary, Snapshot};
use ringwatch_core::types::StrandState;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// SQLite-backed snapshot store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new in-memory store.
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_with_connection(conn)
    }

    /// Create or open a file-backed store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened snapshot database {}", path.as_ref().display());
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS plants (
                id TEXT PRIMARY KEY,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS configurations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                plant_id TEXT NOT NULL,
                data TEXT NOT NULL,
                is_default INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL,
                modified TEXT NOT NULL,
                UNIQUE(name, plant_id),
                FOREIGN KEY (plant_id) REFERENCES plants(id)
            );

            CREATE TABLE IF NOT EXISTS cctv_configs (
                plant_id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                modified TEXT NOT NULL,
                FOREIGN KEY (plant_id) REFERENCES plants(id)
            );

            CREATE TABLE IF NOT EXISTS strand_status_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                plant_id TEXT NOT NULL,
                segment_id TEXT NOT NULL,
                strand INTEGER NOT NULL,
                old_state TEXT NOT NULL,
                new_state TEXT NOT NULL,
                actor TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_config_plant ON configurations(plant_id);
            CREATE INDEX IF NOT EXISTS idx_log_segment ON strand_status_log(plant_id, segment_id);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a plant without storing a snapshot for it.
    pub fn register_plant(&self, plant_id: &str) -> Result<()> {
        let conn = self.conn();
        ensure_plant(&conn, plant_id)
    }
}

fn ensure_plant(conn: &Connection, plant_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO plants (id, created) VALUES (?1, ?2)",
        params![plant_id, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn plant_known(conn: &Connection, plant_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM plants WHERE id = ?1", params![plant_id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn require_plant(conn: &Connection, plant_id: &str) -> Result<()> {
    if plant_known(conn, plant_id)? {
        Ok(())
    } else {
        Err(RingError::plant_not_found(plant_id))
    }
}

fn parse_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_state(row: &Row<'_>, idx: usize) -> rusqlite::Result<StrandState> {
    let text: String = row.get(idx)?;
    Ok(StrandState::from_stored(&text).unwrap_or_default())
}

fn decode(data: Option<String>) -> Result<Option<Snapshot>> {
    data.map(|json| Snapshot::from_json(&json).map_err(RingError::from))
        .transpose()
}

impl SnapshotStore for SqliteStore {
    fn save(&self, name: &str, snapshot: &Snapshot, plant_id: &str, is_default: bool) -> Result<()> {
        let data = serde_json::to_string(snapshot)?;
        let now = Utc::now().to_rfc3339();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        ensure_plant(&tx, plant_id)?;
        if is_default {
            tx.execute(
                "UPDATE configurations SET is_default = 0 WHERE plant_id = ?1",
                params![plant_id],
            )?;
        }
        tx.execute(
            r#"
            INSERT INTO configurations (name, plant_id, data, is_default, created, modified)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(name, plant_id) DO UPDATE SET
                data = excluded.data,
                is_default = excluded.is_default,
                modified = excluded.modified
            "#,
            params![name, plant_id, data, is_default, now],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load(&self, name: &str, plant_id: &str) -> Result<Option<Snapshot>> {
        let data: Option<String> = self
            .conn()
            .query_row(
                "SELECT data FROM configurations WHERE name = ?1 AND plant_id = ?2",
                params![name, plant_id],
                |row| row.get(0),
            )
            .optional()?;
        decode(data)
    }

    fn get_default(&self, plant_id: &str) -> Result<Option<Snapshot>> {
        let conn = self.conn();
        let mut data: Option<String> = conn
            .query_row(
                "SELECT data FROM configurations WHERE plant_id = ?1 AND is_default = 1
                 ORDER BY modified DESC LIMIT 1",
                params![plant_id],
                |row| row.get(0),
            )
            .optional()?;
        if data.is_none() {
            data = conn
                .query_row(
                    "SELECT data FROM configurations WHERE plant_id = ?1 AND name = 'default'",
                    params![plant_id],
                    |row| row.get(0),
                )
                .optional()?;
        }
        decode(data)
    }

    fn list(&self, plant_id: &str) -> Result<Vec<ConfigSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT name, is_default, created, modified FROM configurations
             WHERE plant_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![plant_id], |row| {
            Ok(ConfigSummary {
                name: row.get(0)?,
                is_default: row.get(1)?,
                created: parse_time(row, 2)?,
                modified: parse_time(row, 3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete(&self, name: &str, plant_id: &str) -> Result<bool> {
        let removed = self.conn().execute(
            "DELETE FROM configurations WHERE name = ?1 AND plant_id = ?2",
            params![name, plant_id],
        )?;
        Ok(removed > 0)
    }

    fn plants(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id FROM plants ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    fn create_plant(&self, plant_id: &str) -> Result<()> {
        let conn = self.conn();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO plants (id, created) VALUES (?1, ?2)",
            params![plant_id, Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            warn!("Plant {} already exists", plant_id);
            return Err(RingError::plant_exists(plant_id));
        }
        info!("Plant {} created", plant_id);
        Ok(())
    }

    fn copy_configurations(&self, from: &str, to: &str) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        require_plant(&tx, from)?;
        require_plant(&tx, to)?;

        let has_default: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM configurations WHERE plant_id = ?1 AND is_default = 1)",
            params![from],
            |row| row.get(0),
        )?;
        if has_default {
            tx.execute(
                "UPDATE configurations SET is_default = 0 WHERE plant_id = ?1",
                params![to],
            )?;
        }
        let copied = tx.execute(
            r#"
            INSERT INTO configurations (name, plant_id, data, is_default, created, modified)
            SELECT name, ?2, data, is_default, ?3, ?3 FROM configurations WHERE plant_id = ?1
            ON CONFLICT(name, plant_id) DO UPDATE SET
                data = excluded.data,
                is_default = excluded.is_default,
                created = excluded.created,
                modified = excluded.modified
            "#,
            params![from, to, now],
        )?;
        tx.execute(
            r#"
            INSERT OR REPLACE INTO cctv_configs (plant_id, data, modified)
            SELECT ?2, data, ?3 FROM cctv_configs WHERE plant_id = ?1
            "#,
            params![from, to, now],
        )?;
        tx.commit()?;
        info!("Copied {} snapshots from {} to {}", copied, from, to);
        Ok(copied)
    }

    fn rename_plant(&self, old_id: &str, new_id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        require_plant(&tx, old_id)?;
        if plant_known(&tx, new_id)? {
            return Err(RingError::plant_exists(new_id));
        }

        tx.execute("UPDATE plants SET id = ?2 WHERE id = ?1", params![old_id, new_id])?;
        tx.execute(
            "UPDATE configurations SET plant_id = ?2 WHERE plant_id = ?1",
            params![old_id, new_id],
        )?;
        tx.execute(
            "UPDATE cctv_configs SET plant_id = ?2 WHERE plant_id = ?1",
            params![old_id, new_id],
        )?;
        tx.commit()?;
        info!("Plant {} renamed to {}", old_id, new_id);
        Ok(())
    }

    fn delete_plant(&self, plant_id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        require_plant(&tx, plant_id)?;
        let count: i64 = tx.query_row("SELECT COUNT(*) FROM plants", [], |row| row.get(0))?;
        if count <= 1 {
            warn!("Refusing to delete the last plant {}", plant_id);
            return Err(RingError::last_plant(plant_id));
        }

        tx.execute("DELETE FROM configurations WHERE plant_id = ?1", params![plant_id])?;
        tx.execute("DELETE FROM cctv_configs WHERE plant_id = ?1", params![plant_id])?;
        tx.execute("DELETE FROM plants WHERE id = ?1", params![plant_id])?;
        tx.commit()?;
        info!("Plant {} deleted with its snapshots", plant_id);
        Ok(())
    }

    fn save_cctv_config(&self, plant_id: &str, config: &CctvConfig) -> Result<()> {
        let data = config.to_json()?;
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        ensure_plant(&tx, plant_id)?;
        tx.execute(
            "INSERT OR REPLACE INTO cctv_configs (plant_id, data, modified) VALUES (?1, ?2, ?3)",
            params![plant_id, data, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_cctv_config(&self, plant_id: &str) -> Result<Option<CctvConfig>> {
        let data: Option<String> = self
            .conn()
            .query_row(
                "SELECT data FROM cctv_configs WHERE plant_id = ?1",
                params![plant_id],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|json| CctvConfig::from_json(&json).map_err(RingError::from))
            .transpose()
    }

    fn log_strand_change(&self, change: &StrandChange) -> Result<()> {
        self.conn().execute(
            r#"
            INSERT INTO strand_status_log
                (timestamp, plant_id, segment_id, strand, old_state, new_state, actor)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                change.timestamp.to_rfc3339(),
                change.plant_id,
                change.segment_id,
                change.strand,
                change.old_state.as_str(),
                change.new_state.as_str(),
                change.actor,
            ],
        )?;
        Ok(())
    }

    fn strand_history(&self, query: &HistoryQuery) -> Result<Vec<StrandChange>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT timestamp, plant_id, segment_id, strand, old_state, new_state, actor
            FROM strand_status_log
            WHERE (?1 IS NULL OR plant_id = ?1)
              AND (?2 IS NULL OR segment_id = ?2)
              AND (?3 IS NULL OR strand = ?3)
            ORDER BY id DESC
            LIMIT ?4
            "#,
        )?;
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(
            params![query.plant_id, query.segment_id, query.strand, limit],
            |row| {
                Ok(StrandChange {
                    timestamp: parse_time(row, 0)?,
                    plant_id: row.get(1)?,
                    segment_id: row.get(2)?,
                    strand: row.get(3)?,
                    old_state: parse_state(row, 4)?,
                    new_state: parse_state(row, 5)?,
                    actor: row.get(6)?,
                })
            },
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
