//! Database persistence layer for beaconfield

use crate::config::EngineConfig;
use crate::engine::{BeaconRecord, Engine, LinkStamp, RebuildReport};
use crate::error::{EngineError, Result};
use crate::geometry::Point;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// Abstraction for persistence backends. Implementations save and load the
/// flat beacon record list atomically.
pub trait Persistence: Send + Sync {
    fn save_records(&self, records: &[BeaconRecord]) -> Result<()>;
    fn load_records(&self) -> Result<Vec<BeaconRecord>>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

fn poisoned<T>(_: T) -> EngineError {
    EngineError::DatabaseError("Mutex poisoned".to_string())
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| EngineError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS beacons (
                x INTEGER NOT NULL,
                y INTEGER NOT NULL,
                owner TEXT,
                links TEXT NOT NULL,
                PRIMARY KEY (x, y)
            )",
            [],
        )
        .map_err(|e| EngineError::DatabaseError(format!("Failed to create beacons table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| EngineError::DatabaseError(format!("Failed to create metadata table: {}", e)))?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    /// Replaces every stored record in a single transaction.
    pub fn save_records(&self, records: &[BeaconRecord]) -> Result<()> {
        let conn_guard = self.conn.lock().map_err(poisoned)?;
        let tx = conn_guard.unchecked_transaction().map_err(|e| {
            EngineError::DatabaseError(format!("Failed to start transaction: {}", e))
        })?;

        tx.execute("DELETE FROM beacons", [])
            .map_err(|e| EngineError::DatabaseError(format!("Failed to clear beacons: {}", e)))?;

        for record in records {
            let links_json = serde_json::to_string(&record.links)?;
            tx.execute(
                "INSERT OR REPLACE INTO beacons (x, y, owner, links) VALUES (?1, ?2, ?3, ?4)",
                params![record.coord.x, record.coord.y, record.owner, links_json],
            )
            .map_err(|e| EngineError::DatabaseError(format!("Failed to save beacon: {}", e)))?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('saved_at', ?1)",
            params![chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|e| EngineError::DatabaseError(format!("Failed to save metadata: {}", e)))?;

        tx.commit().map_err(|e| {
            EngineError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    /// Loads every record. Rows whose link list cannot be decoded are kept
    /// without links and logged; the rebuild treats them like any other
    /// damaged record.
    pub fn load_records(&self) -> Result<Vec<BeaconRecord>> {
        let conn_guard = self.conn.lock().map_err(poisoned)?;
        let mut stmt = conn_guard
            .prepare("SELECT x, y, owner, links FROM beacons ORDER BY x, y")
            .map_err(|e| EngineError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let x: i32 = row.get(0)?;
                let y: i32 = row.get(1)?;
                let owner: Option<String> = row.get(2)?;
                let links_json: String = row.get(3)?;
                Ok((Point::new(x, y), owner, links_json))
            })
            .map_err(|e| EngineError::DatabaseError(format!("Failed to query beacons: {}", e)))?;

        let mut records = Vec::new();
        for row_result in rows {
            let (coord, owner, links_json) = row_result
                .map_err(|e| EngineError::DatabaseError(format!("Failed to read row: {}", e)))?;

            let links: Vec<LinkStamp> = match serde_json::from_str(&links_json) {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!(%coord, error = %e, "dropping undecodable link list");
                    Vec::new()
                }
            };
            records.push(BeaconRecord {
                coord,
                owner,
                links,
            });
        }

        Ok(records)
    }

    /// RFC 3339 time of the last successful save, if any.
    pub fn saved_at(&self) -> Result<Option<String>> {
        let conn = self.conn.lock().map_err(poisoned)?;
        let saved_at = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'saved_at'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(saved_at)
    }
}

// Implement the Persistence trait for the rusqlite-backed Database
impl Persistence for Database {
    fn save_records(&self, records: &[BeaconRecord]) -> Result<()> {
        Database::save_records(self, records)
    }

    fn load_records(&self) -> Result<Vec<BeaconRecord>> {
        Database::load_records(self)
    }
}

/// Simple in-memory persistence implementation useful for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    pub records: Arc<Mutex<Vec<BeaconRecord>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn save_records(&self, records: &[BeaconRecord]) -> Result<()> {
        let mut stored = self.records.lock().map_err(poisoned)?;
        *stored = records.to_vec();
        Ok(())
    }

    fn load_records(&self) -> Result<Vec<BeaconRecord>> {
        let stored = self.records.lock().map_err(poisoned)?;
        Ok(stored.clone())
    }
}

impl Engine {
    /// Writes the current beacons and links to `store`.
    pub fn save_to(&self, store: &dyn Persistence) -> Result<()> {
        let records = self.export_state().beacons;
        store.save_records(&records)?;
        tracing::info!(beacons = records.len(), "state saved");
        Ok(())
    }

    /// Builds an engine from whatever `store` holds.
    pub fn load_from(config: EngineConfig, store: &dyn Persistence) -> Result<(Engine, RebuildReport)> {
        let records = store.load_records()?;
        let mut engine = Engine::new(config)?;
        let report = engine.rebuild(&records);
        Ok((engine, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<BeaconRecord> {
        vec![
            BeaconRecord {
                coord: Point::new(0, 0),
                owner: Some("red".to_string()),
                links: vec![LinkStamp {
                    to: Point::new(10, 0),
                    created_at: 7,
                }],
            },
            BeaconRecord {
                coord: Point::new(10, 0),
                owner: Some("red".to_string()),
                links: vec![LinkStamp {
                    to: Point::new(0, 0),
                    created_at: 7,
                }],
            },
            BeaconRecord {
                coord: Point::new(-5, 3),
                owner: None,
                links: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_database_open() {
        let db = Database::open(":memory:").unwrap();
        assert!(db.conn.lock().unwrap().is_autocommit());
        assert!(db.load_records().unwrap().is_empty());
        assert_eq!(db.saved_at().unwrap(), None);
    }

    #[test]
    fn test_save_and_load_records() {
        let db = Database::open(":memory:").unwrap();
        let mut records = sample_records();
        db.save_records(&records).unwrap();

        let mut loaded = db.load_records().unwrap();
        records.sort_by_key(|r| r.coord);
        loaded.sort_by_key(|r| r.coord);
        assert_eq!(records, loaded);
        assert!(db.saved_at().unwrap().is_some());
    }

    #[test]
    fn test_save_replaces_previous_records() {
        let db = Database::open(":memory:").unwrap();
        db.save_records(&sample_records()).unwrap();
        db.save_records(&sample_records()[..1]).unwrap();
        assert_eq!(db.load_records().unwrap().len(), 1);
    }

    #[test]
    fn test_undecodable_links_are_dropped() {
        let db = Database::open(":memory:").unwrap();
        db.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO beacons (x, y, owner, links) VALUES (1, 2, 'red', 'not json')",
                [],
            )
            .unwrap();
        let records = db.load_records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].links.is_empty());
    }

    #[test]
    fn test_in_memory_round_trip_through_engine() {
        let store = InMemoryPersistence::new();
        store.save_records(&sample_records()).unwrap();
        let (engine, report) = Engine::load_from(EngineConfig::default(), &store).unwrap();
        assert_eq!(report.links_replayed, 1);
        assert_eq!(engine.links().count(), 1);

        engine.save_to(&store).unwrap();
        let (reloaded, _) = Engine::load_from(EngineConfig::default(), &store).unwrap();
        assert_eq!(reloaded.export_state(), engine.export_state());
    }
}
