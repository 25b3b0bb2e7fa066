// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process backend for tests and embedding.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::entity::{EntityStore, FieldMatch, PropertyStore, TrustedApplicationRow};
use super::StorageResult;

#[derive(Default)]
struct Tables {
    rows: BTreeMap<i64, TrustedApplicationRow>,
    sequence: i64,
    properties: HashMap<String, String>,
}

/// Entity and property store held in memory.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EntityStore for MemoryDatabase {
    fn find_all(&self) -> StorageResult<Vec<TrustedApplicationRow>> {
        Ok(self.tables().rows.values().cloned().collect())
    }

    fn find_by(&self, field: FieldMatch<'_>) -> StorageResult<Option<TrustedApplicationRow>> {
        let tables = self.tables();
        let found = match field {
            FieldMatch::Id(id) => tables.rows.get(&id).cloned(),
            other => tables.rows.values().find(|row| other.matches(row)).cloned(),
        };
        Ok(found)
    }

    fn insert(&self, mut row: TrustedApplicationRow) -> StorageResult<TrustedApplicationRow> {
        let mut tables = self.tables();
        if row.id < 1 {
            tables.sequence += 1;
            row.id = tables.sequence;
        } else {
            tables.sequence = tables.sequence.max(row.id);
        }
        tables.rows.insert(row.id, row.clone());
        Ok(row)
    }

    fn update(&self, row: &TrustedApplicationRow) -> StorageResult<bool> {
        let mut tables = self.tables();
        match tables.rows.get_mut(&row.id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, id: i64) -> StorageResult<bool> {
        Ok(self.tables().rows.remove(&id).is_some())
    }
}

impl PropertyStore for MemoryDatabase {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.tables().properties.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.tables()
            .properties
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        let mut tables = self.tables();
        for (key, value) in entries {
            tables.properties.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.tables().properties.remove(key);
        Ok(())
    }
}
