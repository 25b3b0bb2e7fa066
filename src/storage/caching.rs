// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caching decorator for a [`TrustedApplicationStore`].

use std::sync::Arc;

use crate::cache::{Snapshot, SnapshotCache};
use crate::error::TrustedAppResult;
use crate::models::TrustedApplicationData;

use super::trusted_apps::TrustedApplicationStore;

/// Serves every read from one cached `get_all()` of the wrapped store.
///
/// Each successful mutation reloads the snapshot exactly once. Errors from the
/// wrapped store propagate unchanged and leave the cache untouched.
pub struct CachingTrustedApplicationStore {
    inner: Arc<dyn TrustedApplicationStore>,
    cache: SnapshotCache<TrustedApplicationData>,
}

impl CachingTrustedApplicationStore {
    pub fn new(inner: Arc<dyn TrustedApplicationStore>) -> Self {
        Self {
            inner,
            cache: SnapshotCache::new("trusted_app_store"),
        }
    }

    fn refresh(&self) -> Option<Arc<Snapshot<TrustedApplicationData>>> {
        self.cache.refresh(|| self.inner.get_all())
    }
}

impl TrustedApplicationStore for CachingTrustedApplicationStore {
    fn get_all(&self) -> TrustedAppResult<Vec<Arc<TrustedApplicationData>>> {
        Ok(self.cache.get_or_load(|| self.inner.get_all())?.all())
    }

    fn get_by_id(&self, id: i64) -> TrustedAppResult<Option<Arc<TrustedApplicationData>>> {
        Ok(self.cache.get_or_load(|| self.inner.get_all())?.by_id(id))
    }

    fn get_by_application_id(
        &self,
        application_id: &str,
    ) -> TrustedAppResult<Option<Arc<TrustedApplicationData>>> {
        Ok(self
            .cache
            .get_or_load(|| self.inner.get_all())?
            .by_application_id(application_id))
    }

    fn store(&self, data: &TrustedApplicationData) -> TrustedAppResult<Arc<TrustedApplicationData>> {
        let stored = self.inner.store(data)?;
        // Hand out the cached instance so later lookups return the same reference
        Ok(self
            .refresh()
            .and_then(|snapshot| snapshot.by_id(stored.id()))
            .unwrap_or(stored))
    }

    fn delete(&self, id: i64) -> TrustedAppResult<bool> {
        let removed = self.inner.delete(id)?;
        self.refresh();
        Ok(removed)
    }

    fn delete_by_application_id(&self, application_id: &str) -> TrustedAppResult<bool> {
        let removed = self.inner.delete_by_application_id(application_id)?;
        self.refresh();
        Ok(removed)
    }
}
