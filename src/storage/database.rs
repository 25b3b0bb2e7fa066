// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded registry database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `trusted_apps`: numeric id → serialized TrustedApplicationRow
//! - `sequences`: sequence name → last id handed out
//! - `properties`: property key → value

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::entity::{EntityStore, FieldMatch, PropertyStore, TrustedApplicationRow};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: id → serialized TrustedApplicationRow (JSON bytes).
const TRUSTED_APPS: TableDefinition<u64, &[u8]> = TableDefinition::new("trusted_apps");

/// Sequence name → last assigned value.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Settings: key → value.
const PROPERTIES: TableDefinition<&str, &str> = TableDefinition::new("properties");

const TRUSTED_APP_SEQUENCE: &str = "trusted_app_id";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("id out of range: {0}")]
    InvalidId(i64),
}

pub type StorageResult<T> = Result<T, StorageError>;

fn key_for(id: i64) -> StorageResult<u64> {
    u64::try_from(id)
        .ok()
        .filter(|key| *key > 0)
        .ok_or(StorageError::InvalidId(id))
}

// =============================================================================
// RedbDatabase
// =============================================================================

/// Embedded ACID registry database.
pub struct RedbDatabase {
    db: Database,
}

impl RedbDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TRUSTED_APPS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
            let _ = write_txn.open_table(PROPERTIES)?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Opened registry database");
        Ok(Self { db })
    }
}

impl EntityStore for RedbDatabase {
    fn find_all(&self) -> StorageResult<Vec<TrustedApplicationRow>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRUSTED_APPS)?;
        let mut rows = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    fn find_by(&self, field: FieldMatch<'_>) -> StorageResult<Option<TrustedApplicationRow>> {
        if let FieldMatch::Id(id) = field {
            if id < 1 {
                return Ok(None);
            }
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(TRUSTED_APPS)?;
            return match table.get(key_for(id)?)? {
                Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                None => Ok(None),
            };
        }

        // No secondary index; the registry is small
        Ok(self.find_all()?.into_iter().find(|row| field.matches(row)))
    }

    fn insert(&self, mut row: TrustedApplicationRow) -> StorageResult<TrustedApplicationRow> {
        let write_txn = self.db.begin_write()?;
        {
            let mut sequences = write_txn.open_table(SEQUENCES)?;
            let last = sequences
                .get(TRUSTED_APP_SEQUENCE)?
                .map(|value| value.value())
                .unwrap_or(0);

            let key = if row.id < 1 {
                let next = last + 1;
                row.id = i64::try_from(next).map_err(|_| StorageError::InvalidId(row.id))?;
                next
            } else {
                key_for(row.id)?
            };
            sequences.insert(TRUSTED_APP_SEQUENCE, last.max(key))?;

            let json = serde_json::to_vec(&row)?;
            let mut table = write_txn.open_table(TRUSTED_APPS)?;
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(row)
    }

    fn update(&self, row: &TrustedApplicationRow) -> StorageResult<bool> {
        if row.id < 1 {
            return Ok(false);
        }
        let key = key_for(row.id)?;
        let json = serde_json::to_vec(row)?;

        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(TRUSTED_APPS)?;
            let exists = table.get(key)?.is_some();
            if exists {
                table.insert(key, json.as_slice())?;
            }
            exists
        };
        write_txn.commit()?;
        Ok(updated)
    }

    fn remove(&self, id: i64) -> StorageResult<bool> {
        if id < 1 {
            return Ok(false);
        }
        let key = key_for(id)?;

        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(TRUSTED_APPS)?;
            let removed = table.remove(key)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

impl PropertyStore for RedbDatabase {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROPERTIES)?;
        match table.get(key)? {
            Some(v) => Ok(Some(v.value().to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROPERTIES)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROPERTIES)?;
            for (key, value) in entries {
                table.insert(*key, *value)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROPERTIES)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_db() -> (RedbDatabase, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = RedbDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn row(application_id: &str) -> TrustedApplicationRow {
        TrustedApplicationRow {
            application_id: Some(application_id.to_string()),
            name: Some(format!("{application_id} server")),
            public_key: Some("KEY".to_string()),
            timeout: 1000,
            created: Some(1_700_000_000_123),
            created_by: Some("admin".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn insert_and_find() {
        let (db, _dir) = temp_db();
        let stored = db.insert(row("CONF")).unwrap();
        assert_eq!(stored.id, 1);

        let by_id = db.find_by(FieldMatch::Id(1)).unwrap().unwrap();
        assert_eq!(by_id, stored);
        assert_eq!(by_id.created, Some(1_700_000_000_123));

        let by_app = db.find_by(FieldMatch::ApplicationId("CONF")).unwrap().unwrap();
        assert_eq!(by_app.id, 1);

        assert!(db.find_by(FieldMatch::Id(2)).unwrap().is_none());
        assert!(db.find_by(FieldMatch::Id(0)).unwrap().is_none());
    }

    #[test]
    fn find_all_is_ordered_by_id() {
        let (db, _dir) = temp_db();
        db.insert(row("CONF")).unwrap();
        db.insert(row("BAM")).unwrap();
        db.insert(row("FE")).unwrap();

        let ids: Vec<i64> = db.find_all().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn sequence_survives_removal_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.redb");
        {
            let db = RedbDatabase::open(&path).unwrap();
            db.insert(row("CONF")).unwrap();
            let second = db.insert(row("BAM")).unwrap();
            assert!(EntityStore::remove(&db, second.id).unwrap());
            assert!(!EntityStore::remove(&db, second.id).unwrap());
        }

        let db = RedbDatabase::open(&path).unwrap();
        assert_eq!(db.find_all().unwrap().len(), 1);
        assert_eq!(db.insert(row("FE")).unwrap().id, 3);
    }

    #[test]
    fn update_replaces_existing_only() {
        let (db, _dir) = temp_db();
        let mut stored = db.insert(row("CONF")).unwrap();
        stored.timeout = 5000;
        assert!(db.update(&stored).unwrap());
        assert_eq!(db.find_by(FieldMatch::Id(stored.id)).unwrap().unwrap().timeout, 5000);

        let missing = TrustedApplicationRow { id: 42, ..row("X") };
        assert!(!db.update(&missing).unwrap());
        assert!(db.find_by(FieldMatch::Id(42)).unwrap().is_none());
    }

    #[test]
    fn properties_round_trip() {
        let (db, _dir) = temp_db();
        assert_eq!(PropertyStore::get(&db, "trustedapp.uid").unwrap(), None);
        db.set("trustedapp.uid", "jira:1").unwrap();
        assert_eq!(
            PropertyStore::get(&db, "trustedapp.uid").unwrap().as_deref(),
            Some("jira:1")
        );
        PropertyStore::remove(&db, "trustedapp.uid").unwrap();
        assert_eq!(PropertyStore::get(&db, "trustedapp.uid").unwrap(), None);
    }

    #[test]
    fn set_all_writes_every_entry_durably() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.redb");
        {
            let db = RedbDatabase::open(&path).unwrap();
            db.set("trustedapp.uid", "old").unwrap();
            db.set_all(&[("trustedapp.uid", "jira:1"), ("trustedapp.public.key", "AAAA")])
                .unwrap();
        }

        let db = RedbDatabase::open(&path).unwrap();
        assert_eq!(
            PropertyStore::get(&db, "trustedapp.uid").unwrap().as_deref(),
            Some("jira:1")
        );
        assert_eq!(
            PropertyStore::get(&db, "trustedapp.public.key").unwrap().as_deref(),
            Some("AAAA")
        );
    }
}
