// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted application store: CRUD over entity rows, keyed by numeric id and
//! by application id.

use std::sync::Arc;

use crate::error::{TrustedAppError, TrustedAppResult};
use crate::models::{TrustedApplicationBuilder, TrustedApplicationData};

use super::entity::{EntityStore, FieldMatch, TrustedApplicationRow};

/// Persistence port for [`TrustedApplicationData`].
///
/// Lookups of absent records return `Ok(None)` / `Ok(false)`, never an error.
pub trait TrustedApplicationStore: Send + Sync {
    /// Every stored record, ordered by numeric id.
    fn get_all(&self) -> TrustedAppResult<Vec<Arc<TrustedApplicationData>>>;

    fn get_by_id(&self, id: i64) -> TrustedAppResult<Option<Arc<TrustedApplicationData>>>;

    fn get_by_application_id(
        &self,
        application_id: &str,
    ) -> TrustedAppResult<Option<Arc<TrustedApplicationData>>>;

    /// Persist a record. An unset id (`< 1`) is assigned by the backend;
    /// otherwise the record replaces the one with the same id.
    fn store(&self, data: &TrustedApplicationData) -> TrustedAppResult<Arc<TrustedApplicationData>>;

    fn delete(&self, id: i64) -> TrustedAppResult<bool>;

    fn delete_by_application_id(&self, application_id: &str) -> TrustedAppResult<bool>;
}

/// Store backed by an [`EntityStore`].
pub struct DefaultTrustedApplicationStore {
    entities: Arc<dyn EntityStore>,
}

impl DefaultTrustedApplicationStore {
    pub fn new(entities: Arc<dyn EntityStore>) -> Self {
        Self { entities }
    }

    fn to_data(row: &TrustedApplicationRow) -> TrustedAppResult<TrustedApplicationData> {
        TrustedApplicationBuilder::from_row(row)
            .to_data()
            .map_err(|e| TrustedAppError::illegal_state(format!("row {} is incomplete: {e}", row.id)))
    }

    fn find(&self, field: FieldMatch<'_>) -> TrustedAppResult<Option<Arc<TrustedApplicationData>>> {
        match self.entities.find_by(field)? {
            Some(row) => Ok(Some(Arc::new(Self::to_data(&row)?))),
            None => Ok(None),
        }
    }
}

impl TrustedApplicationStore for DefaultTrustedApplicationStore {
    fn get_all(&self) -> TrustedAppResult<Vec<Arc<TrustedApplicationData>>> {
        let rows = self.entities.find_all()?;
        let mut all = Vec::with_capacity(rows.len());
        for row in rows {
            match Self::to_data(&row) {
                Ok(data) => all.push(Arc::new(data)),
                Err(e) => {
                    tracing::warn!(id = row.id, error = %e, "Skipping incomplete trusted application row");
                }
            }
        }
        Ok(all)
    }

    fn get_by_id(&self, id: i64) -> TrustedAppResult<Option<Arc<TrustedApplicationData>>> {
        self.find(FieldMatch::Id(id))
    }

    fn get_by_application_id(
        &self,
        application_id: &str,
    ) -> TrustedAppResult<Option<Arc<TrustedApplicationData>>> {
        self.find(FieldMatch::ApplicationId(application_id))
    }

    fn store(&self, data: &TrustedApplicationData) -> TrustedAppResult<Arc<TrustedApplicationData>> {
        let row = data.to_row();
        let id = if row.id < 1 || !self.entities.update(&row)? {
            self.entities.insert(row)?.id
        } else {
            row.id
        };

        let stored = TrustedApplicationBuilder::from_data(data).with_id(id).to_data()?;
        tracing::info!(
            id,
            application_id = stored.application_id(),
            "Stored trusted application"
        );
        Ok(Arc::new(stored))
    }

    fn delete(&self, id: i64) -> TrustedAppResult<bool> {
        let removed = self.entities.remove(id)?;
        if removed {
            tracing::info!(id, "Deleted trusted application");
        }
        Ok(removed)
    }

    fn delete_by_application_id(&self, application_id: &str) -> TrustedAppResult<bool> {
        match self.entities.find_by(FieldMatch::ApplicationId(application_id))? {
            Some(row) => self.delete(row.id),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryDatabase, RedbDatabase};
    use crate::test_support::{data_builder, PUBLIC_KEY_2048};
    use tempfile::TempDir;

    fn memory_store() -> (DefaultTrustedApplicationStore, Arc<MemoryDatabase>) {
        let db = Arc::new(MemoryDatabase::new());
        (DefaultTrustedApplicationStore::new(db.clone()), db)
    }

    #[test]
    fn store_assigns_id_and_reads_back() {
        let (store, _) = memory_store();
        let data = data_builder("CONF").to_data().unwrap();
        assert_eq!(data.id(), 0);

        let stored = store.store(&data).unwrap();
        assert_eq!(stored.id(), 1);
        assert_eq!(stored.public_key(), PUBLIC_KEY_2048);

        let by_id = store.get_by_id(1).unwrap().unwrap();
        let by_app = store.get_by_application_id("CONF").unwrap().unwrap();
        assert_eq!(*by_id, *stored);
        assert_eq!(*by_app, *stored);
    }

    #[test]
    fn store_with_id_replaces_record() {
        let (store, _) = memory_store();
        let stored = store.store(&data_builder("CONF").to_data().unwrap()).unwrap();

        let renamed = TrustedApplicationBuilder::from_data(&stored)
            .with_name("Renamed")
            .to_data()
            .unwrap();
        let again = store.store(&renamed).unwrap();
        assert_eq!(again.id(), stored.id());

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name(), "Renamed");
    }

    #[test]
    fn store_with_unknown_id_inserts_under_that_id() {
        let (store, _) = memory_store();
        let data = data_builder("CONF").with_id(7).to_data().unwrap();
        assert_eq!(store.store(&data).unwrap().id(), 7);
        assert!(store.get_by_id(7).unwrap().is_some());
    }

    #[test]
    fn missing_records_are_absent_not_errors() {
        let (store, _) = memory_store();
        assert!(store.get_by_id(3).unwrap().is_none());
        assert!(store.get_by_application_id("nope").unwrap().is_none());
        assert!(!store.delete(3).unwrap());
        assert!(!store.delete_by_application_id("nope").unwrap());
    }

    #[test]
    fn delete_both_ways() {
        let (store, _) = memory_store();
        let conf = store.store(&data_builder("CONF").to_data().unwrap()).unwrap();
        store.store(&data_builder("BAM").to_data().unwrap()).unwrap();

        assert!(store.delete(conf.id()).unwrap());
        assert!(store.delete_by_application_id("BAM").unwrap());
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn incomplete_rows_are_skipped_in_listing() {
        let (store, db) = memory_store();
        store.store(&data_builder("CONF").to_data().unwrap()).unwrap();
        db.insert(TrustedApplicationRow {
            application_id: Some("BROKEN".to_string()),
            ..Default::default()
        })
        .unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].application_id(), "CONF");

        assert!(matches!(
            store.get_by_application_id("BROKEN"),
            Err(TrustedAppError::IllegalState(_))
        ));
    }

    #[test]
    fn invalid_key_rows_still_load() {
        let (store, _) = memory_store();
        let data = data_builder("CONF")
            .with_encoded_public_key("CRAPPYNOTENCODEDKEYDATA")
            .to_data()
            .unwrap();
        store.store(&data).unwrap();

        let loaded = store.get_by_application_id("CONF").unwrap().unwrap();
        assert_eq!(loaded.public_key(), "CRAPPYNOTENCODEDKEYDATA");
    }

    #[test]
    fn redb_backend_round_trips_timestamps() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(RedbDatabase::open(&dir.path().join("apps.redb")).unwrap());
        let store = DefaultTrustedApplicationStore::new(db);

        let data = data_builder("CONF")
            .with_ip_match(Some("10.0.0.*\r\n192.168.0.1"))
            .to_data()
            .unwrap();
        let stored = store.store(&data).unwrap();
        let loaded = store.get_by_id(stored.id()).unwrap().unwrap();

        assert_eq!(*loaded, *stored);
        assert_eq!(loaded.created().when(), data.created().when());
        assert_eq!(loaded.ip_match(), Some("10.0.0.*\n192.168.0.1"));
    }
}
