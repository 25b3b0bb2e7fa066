// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caching decorator for a [`TrustedApplicationManager`].
//!
//! Same discipline as the store cache one layer up: one `get_all()` per
//! snapshot, reload after every successful mutation, and point lookups served
//! from the snapshot so the same `Arc` comes back until the next mutation.

use std::sync::Arc;

use crate::cache::{Snapshot, SnapshotCache};
use crate::error::TrustedAppResult;
use crate::models::TrustedApplicationInfo;

use super::TrustedApplicationManager;

pub struct CachingTrustedApplicationManager {
    inner: Arc<dyn TrustedApplicationManager>,
    cache: SnapshotCache<TrustedApplicationInfo>,
}

impl CachingTrustedApplicationManager {
    pub fn new(inner: Arc<dyn TrustedApplicationManager>) -> Self {
        Self {
            inner,
            cache: SnapshotCache::new("trusted_app_manager"),
        }
    }

    fn refresh(&self) -> Option<Arc<Snapshot<TrustedApplicationInfo>>> {
        self.cache.refresh(|| self.inner.get_all())
    }
}

impl TrustedApplicationManager for CachingTrustedApplicationManager {
    fn get_all(&self) -> TrustedAppResult<Vec<Arc<TrustedApplicationInfo>>> {
        Ok(self.cache.get_or_load(|| self.inner.get_all())?.all())
    }

    fn get_by_id(&self, id: i64) -> TrustedAppResult<Option<Arc<TrustedApplicationInfo>>> {
        Ok(self.cache.get_or_load(|| self.inner.get_all())?.by_id(id))
    }

    fn get_by_application_id(
        &self,
        application_id: &str,
    ) -> TrustedAppResult<Option<Arc<TrustedApplicationInfo>>> {
        Ok(self
            .cache
            .get_or_load(|| self.inner.get_all())?
            .by_application_id(application_id))
    }

    fn store(
        &self,
        user: &str,
        info: &TrustedApplicationInfo,
    ) -> TrustedAppResult<Arc<TrustedApplicationInfo>> {
        let stored = self.inner.store(user, info)?;
        // Hand out the cached instance so later lookups return the same reference
        Ok(self
            .refresh()
            .and_then(|snapshot| snapshot.by_id(stored.id()))
            .unwrap_or(stored))
    }

    fn delete(&self, user: &str, id: i64) -> TrustedAppResult<bool> {
        let removed = self.inner.delete(user, id)?;
        self.refresh();
        Ok(removed)
    }

    fn delete_by_application_id(&self, user: &str, application_id: &str) -> TrustedAppResult<bool> {
        let removed = self.inner.delete_by_application_id(user, application_id)?;
        self.refresh();
        Ok(removed)
    }
}
