// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-slot snapshot cache for the trusted application registry.
//!
//! The whole collection is cached as one immutable [`Snapshot`] holding the
//! records and two indexes built from them. Readers clone the current
//! `Arc<Snapshot>` and work against it; a mutation swaps in a freshly loaded
//! snapshot in one step, so no reader ever sees a mix of old and new indexes.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{TrustedApplicationData, TrustedApplicationInfo};

/// Keys a cached record is indexed under.
pub trait Indexed {
    fn numeric_id(&self) -> i64;
    fn application_id(&self) -> &str;
}

impl Indexed for TrustedApplicationData {
    fn numeric_id(&self) -> i64 {
        self.id()
    }

    fn application_id(&self) -> &str {
        TrustedApplicationData::application_id(self)
    }
}

impl Indexed for TrustedApplicationInfo {
    fn numeric_id(&self) -> i64 {
        self.id()
    }

    fn application_id(&self) -> &str {
        TrustedApplicationInfo::application_id(self)
    }
}

/// Immutable view of the full collection.
pub struct Snapshot<T> {
    items: Vec<Arc<T>>,
    by_id: HashMap<i64, Arc<T>>,
    by_application_id: HashMap<String, Arc<T>>,
}

impl<T: Indexed> Snapshot<T> {
    pub fn new(items: Vec<Arc<T>>) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        let mut by_application_id = HashMap::with_capacity(items.len());
        for item in &items {
            by_id.insert(item.numeric_id(), Arc::clone(item));
            by_application_id.insert(item.application_id().to_string(), Arc::clone(item));
        }
        Self {
            items,
            by_id,
            by_application_id,
        }
    }

    pub fn all(&self) -> Vec<Arc<T>> {
        self.items.clone()
    }

    pub fn by_id(&self, id: i64) -> Option<Arc<T>> {
        self.by_id.get(&id).cloned()
    }

    pub fn by_application_id(&self, application_id: &str) -> Option<Arc<T>> {
        self.by_application_id.get(application_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Lazily populated holder of the current [`Snapshot`].
pub struct SnapshotCache<T> {
    name: &'static str,
    slot: RwLock<Option<Arc<Snapshot<T>>>>,
}

impl<T: Indexed> SnapshotCache<T> {
    /// `name` only labels log lines.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: RwLock::new(None),
        }
    }

    /// Current snapshot, loading it with `load` if the slot is empty.
    ///
    /// Concurrent first readers load once: the slot is re-checked under the
    /// write lock.
    pub fn get_or_load<E>(
        &self,
        load: impl FnOnce() -> Result<Vec<Arc<T>>, E>,
    ) -> Result<Arc<Snapshot<T>>, E> {
        if let Some(snapshot) = self.slot.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = slot.as_ref() {
            return Ok(Arc::clone(snapshot));
        }
        let snapshot = Arc::new(Snapshot::new(load()?));
        tracing::debug!(cache = self.name, entries = snapshot.len(), "Cache loaded");
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Replace the snapshot after a successful mutation and return it.
    ///
    /// If reloading fails the slot is emptied so the next read retries, and
    /// `None` is returned.
    pub fn refresh<E: Display>(
        &self,
        load: impl FnOnce() -> Result<Vec<Arc<T>>, E>,
    ) -> Option<Arc<Snapshot<T>>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        match load() {
            Ok(items) => {
                let snapshot = Arc::new(Snapshot::new(items));
                tracing::debug!(cache = self.name, entries = snapshot.len(), "Cache reloaded");
                *slot = Some(Arc::clone(&snapshot));
                Some(snapshot)
            }
            Err(e) => {
                tracing::warn!(cache = self.name, error = %e, "Cache reload failed, invalidating");
                *slot = None;
                None
            }
        }
    }

    /// Drop the snapshot; the next read reloads.
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}
