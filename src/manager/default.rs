// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit-stamping manager over a store.

use std::sync::Arc;

use crate::error::{TrustedAppError, TrustedAppResult};
use crate::models::{
    AuditLog, TrustedApplicationBuilder, TrustedApplicationData, TrustedApplicationInfo,
};
use crate::storage::TrustedApplicationStore;

use super::TrustedApplicationManager;

pub struct DefaultTrustedApplicationManager {
    store: Arc<dyn TrustedApplicationStore>,
}

impl DefaultTrustedApplicationManager {
    pub fn new(store: Arc<dyn TrustedApplicationStore>) -> Self {
        Self { store }
    }

    fn to_info(data: &TrustedApplicationData) -> TrustedAppResult<Arc<TrustedApplicationInfo>> {
        let info = TrustedApplicationBuilder::from_data(data).to_info()?;
        if !info.is_valid_key() {
            tracing::warn!(
                application_id = info.application_id(),
                "Trusted application has an unusable public key"
            );
        }
        Ok(Arc::new(info))
    }
}

impl TrustedApplicationManager for DefaultTrustedApplicationManager {
    fn get_all(&self) -> TrustedAppResult<Vec<Arc<TrustedApplicationInfo>>> {
        self.store
            .get_all()?
            .iter()
            .map(|data| Self::to_info(data))
            .collect()
    }

    fn get_by_id(&self, id: i64) -> TrustedAppResult<Option<Arc<TrustedApplicationInfo>>> {
        self.store
            .get_by_id(id)?
            .map(|data| Self::to_info(&data))
            .transpose()
    }

    fn get_by_application_id(
        &self,
        application_id: &str,
    ) -> TrustedAppResult<Option<Arc<TrustedApplicationInfo>>> {
        self.store
            .get_by_application_id(application_id)?
            .map(|data| Self::to_info(&data))
            .transpose()
    }

    fn store(
        &self,
        user: &str,
        info: &TrustedApplicationInfo,
    ) -> TrustedAppResult<Arc<TrustedApplicationInfo>> {
        let now = AuditLog::now(user);
        let created = if info.is_persisted() {
            let existing = self.store.get_by_id(info.id())?.ok_or_else(|| {
                TrustedAppError::invalid_argument(format!(
                    "cannot update trusted application {}: id {} does not exist",
                    info.application_id(),
                    info.id()
                ))
            })?;
            existing.created().clone()
        } else {
            now.clone()
        };

        let data = TrustedApplicationBuilder::from_info(info)
            .with_created(created)
            .with_updated(now)
            .to_data()?;
        let stored = self.store.store(&data)?;
        tracing::info!(
            user,
            id = stored.id(),
            application_id = stored.application_id(),
            "Trusted application saved"
        );
        Self::to_info(&stored)
    }

    fn delete(&self, user: &str, id: i64) -> TrustedAppResult<bool> {
        let removed = self.store.delete(id)?;
        tracing::info!(user, id, removed, "Trusted application delete");
        Ok(removed)
    }

    fn delete_by_application_id(&self, user: &str, application_id: &str) -> TrustedAppResult<bool> {
        let removed = self.store.delete_by_application_id(application_id)?;
        tracing::info!(user, application_id, removed, "Trusted application delete");
        Ok(removed)
    }
}
