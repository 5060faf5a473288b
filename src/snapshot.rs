// Snapshot persistence - SQLite history of registries
//
// Every successful reprocess appends one row; older rows beyond the
// retention count are pruned in the same transaction. A row stores the
// registry as JSON with a SHA-256 checksum of that JSON and the format
// version it was written with, and is only loaded back if both verify.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::entity::SanctionedEntity;
use crate::error::{Result, SanctionsError};
use crate::registry::SanctionsRegistry;

/// Newest payload layout this build reads and writes
pub const FORMAT_VERSION: u32 = 1;

/// Descriptive columns of one stored snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub id: String,
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub entity_count: usize,
    pub checksum: String,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    retain: usize,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>, retain: usize) -> Self {
        SnapshotStore {
            path: path.into(),
            retain: retain.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when at least one snapshot can be described
    pub fn exists(&self) -> bool {
        matches!(self.latest_meta(), Ok(Some(_)))
    }

    /// Persist `registry` as the newest snapshot and prune old ones.
    /// Nothing is visible to readers until the transaction commits.
    pub fn save(&self, registry: &SanctionsRegistry) -> Result<SnapshotMeta> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SanctionsError::io(parent, e))?;
        }

        let payload = serde_json::to_string(registry.entities())?;
        let meta = SnapshotMeta {
            id: uuid::Uuid::new_v4().to_string(),
            format_version: FORMAT_VERSION,
            created_at: Utc::now(),
            entity_count: registry.len(),
            checksum: checksum(&payload),
        };

        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO snapshots (snapshot_id, format_version, created_at, entity_count, checksum, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                meta.id,
                meta.format_version,
                meta.created_at.to_rfc3339(),
                meta.entity_count as i64,
                meta.checksum,
                payload,
            ],
        )?;
        let pruned = tx.execute(
            "DELETE FROM snapshots
             WHERE id NOT IN (SELECT id FROM snapshots ORDER BY id DESC LIMIT ?1)",
            params![self.retain as i64],
        )?;
        tx.commit()?;

        info!(
            "Saved snapshot {} ({} entities) to {}",
            meta.id,
            meta.entity_count,
            self.path.display()
        );
        if pruned > 0 {
            debug!("Pruned {} old snapshots", pruned);
        }
        Ok(meta)
    }

    /// Newest snapshot, verified. `Ok(None)` when there is none.
    pub fn load_latest(&self) -> Result<Option<(SnapshotMeta, SanctionsRegistry)>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let conn = self.open()?;
        let row = conn
            .query_row(
                "SELECT snapshot_id, format_version, created_at, entity_count, checksum, payload
                 FROM snapshots ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((meta_from_row(row)?, row.get::<_, String>(5)?)),
            )
            .optional()?;

        let (meta, payload) = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        if meta.format_version > FORMAT_VERSION {
            return Err(SanctionsError::UnsupportedFormat {
                id: meta.id,
                found: meta.format_version,
                supported: FORMAT_VERSION,
            });
        }
        if checksum(&payload) != meta.checksum {
            return Err(SanctionsError::ChecksumMismatch { id: meta.id });
        }

        let entities: Vec<SanctionedEntity> = serde_json::from_str(&payload)?;
        info!("Loaded snapshot {} ({} entities)", meta.id, entities.len());
        Ok(Some((meta, SanctionsRegistry::new(entities))))
    }

    /// Metadata of the newest snapshot without reading its payload
    pub fn latest_meta(&self) -> Result<Option<SnapshotMeta>> {
        Ok(self.history()?.into_iter().next())
    }

    /// Metadata of every retained snapshot, newest first
    pub fn history(&self) -> Result<Vec<SnapshotMeta>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT snapshot_id, format_version, created_at, entity_count, checksum
             FROM snapshots ORDER BY id DESC",
        )?;
        let metas = stmt
            .query_map([], |row| meta_from_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(metas)
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snapshot_id TEXT UNIQUE NOT NULL,
                format_version INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                entity_count INTEGER NOT NULL,
                checksum TEXT NOT NULL,
                payload TEXT NOT NULL
            )",
            [],
        )?;
        Ok(conn)
    }
}

fn checksum(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn meta_from_row(row: &Row<'_>) -> rusqlite::Result<SnapshotMeta> {
    let created_at: String = row.get(2)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);
    let entity_count: i64 = row.get(3)?;

    Ok(SnapshotMeta {
        id: row.get(0)?,
        format_version: row.get(1)?,
        created_at,
        entity_count: entity_count.max(0) as usize,
        checksum: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Source;

    fn registry(names: &[&str]) -> SanctionsRegistry {
        SanctionsRegistry::new(
            names
                .iter()
                .map(|name| SanctionedEntity::new(*name, Source::Sdn))
                .collect(),
        )
    }

    #[test]
    fn test_missing_store_has_no_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path().join("snap.db"), 3);

        assert!(store.load_latest().unwrap().is_none());
        assert!(store.latest_meta().unwrap().is_none());
        assert!(!store.exists());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_then_load_latest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path().join("nested/snap.db"), 3);

        store.save(&registry(&["FIRST"])).unwrap();
        let meta = store.save(&registry(&["SECOND", "THIRD"])).unwrap();

        let (loaded_meta, loaded) = store.load_latest().unwrap().unwrap();
        assert_eq!(loaded_meta, meta);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.entities()[0].name, "SECOND");
        assert_eq!(meta.format_version, FORMAT_VERSION);
        assert_eq!(meta.checksum.len(), 64);
    }

    #[test]
    fn test_history_is_pruned_to_retention() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path().join("snap.db"), 2);

        for name in ["A", "B", "C", "D"] {
            store.save(&registry(&[name])).unwrap();
        }

        let history = store.history().unwrap();
        assert_eq!(history.len(), 2);
        let (_, latest) = store.load_latest().unwrap().unwrap();
        assert_eq!(latest.entities()[0].name, "D");
    }

    #[test]
    fn test_tampered_payload_fails_checksum() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("snap.db");
        let store = SnapshotStore::new(&path, 3);
        store.save(&registry(&["GENUINE"])).unwrap();

        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "UPDATE snapshots SET payload = '[{\"name\":\"FORGED\",\"source\":\"SDN\"}]'",
            [],
        )
        .unwrap();

        assert!(matches!(
            store.load_latest(),
            Err(SanctionsError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_newer_format_version_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("snap.db");
        let store = SnapshotStore::new(&path, 3);
        store.save(&registry(&["X"])).unwrap();

        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE snapshots SET format_version = 99", [])
            .unwrap();

        assert!(matches!(
            store.load_latest(),
            Err(SanctionsError::UnsupportedFormat { found: 99, .. })
        ));
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("snap.db");
        fs::write(&path, b"this is not a database, just some text padding it out").unwrap();

        assert!(SnapshotStore::new(&path, 3).load_latest().is_err());
    }
}
