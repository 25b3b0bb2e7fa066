// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wiring of the registry layers into one shareable handle.

use std::sync::Arc;

use crate::auth::{PermissionManager, RolePermissionManager};
use crate::config::Config;
use crate::current::CurrentApplicationStore;
use crate::error::{TrustedAppError, TrustedAppResult};
use crate::manager::{
    CachingTrustedApplicationManager, DefaultTrustedApplicationManager, TrustedApplicationManager,
};
use crate::remote::{ApplicationInfoProvider, HttpApplicationInfoProvider};
use crate::service::TrustedApplicationService;
use crate::storage::{
    CachingTrustedApplicationStore, DefaultTrustedApplicationStore, EntityStore, MemoryDatabase,
    PropertyStore, RedbDatabase,
};
use crate::validation::{
    DelegatingValidator, SemanticValidator, SyntacticValidator, TrustedApplicationValidator,
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TrustedApplicationService>,
    pub manager: Arc<dyn TrustedApplicationManager>,
    pub current_app: Arc<CurrentApplicationStore>,
}

impl AppState {
    /// Open the redb database under `config.data_dir`.
    pub fn open(config: &Config) -> TrustedAppResult<Self> {
        let path = config.database_path();
        let db = Arc::new(RedbDatabase::open(&path)?);
        tracing::info!(path = %path.display(), "Opened registry database");
        Self::builder(config).build(db.clone(), db)
    }

    /// Volatile state backed by a [`MemoryDatabase`].
    pub fn in_memory(config: &Config) -> TrustedAppResult<Self> {
        let db = Arc::new(MemoryDatabase::new());
        Self::builder(config).build(db.clone(), db)
    }

    pub fn builder(config: &Config) -> AppStateBuilder {
        AppStateBuilder {
            config: config.clone(),
            permissions: None,
            provider: None,
            validators: Vec::new(),
        }
    }
}

/// Overrides for the pluggable collaborators of [`AppState`].
pub struct AppStateBuilder {
    config: Config,
    permissions: Option<Arc<dyn PermissionManager>>,
    provider: Option<Arc<dyn ApplicationInfoProvider>>,
    validators: Vec<Arc<dyn TrustedApplicationValidator>>,
}

impl AppStateBuilder {
    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionManager>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn ApplicationInfoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Extra validator, run after the built-in syntactic and semantic checks.
    pub fn with_validator(mut self, validator: Arc<dyn TrustedApplicationValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn build(
        self,
        entities: Arc<dyn EntityStore>,
        properties: Arc<dyn PropertyStore>,
    ) -> TrustedAppResult<AppState> {
        let store = Arc::new(CachingTrustedApplicationStore::new(Arc::new(
            DefaultTrustedApplicationStore::new(entities),
        )));
        let manager: Arc<dyn TrustedApplicationManager> = Arc::new(
            CachingTrustedApplicationManager::new(Arc::new(DefaultTrustedApplicationManager::new(store))),
        );

        let validator = self.validators.into_iter().fold(
            DelegatingValidator::default()
                .with(Arc::new(SyntacticValidator::new()))
                .with(Arc::new(SemanticValidator::new(Arc::clone(&manager)))),
            DelegatingValidator::with,
        );

        let provider = match self.provider {
            Some(provider) => provider,
            None => Arc::new(
                HttpApplicationInfoProvider::new(self.config.fetch_timeout)
                    .map_err(|e| TrustedAppError::illegal_state(e.to_string()))?,
            ),
        };
        let permissions = self
            .permissions
            .unwrap_or_else(|| Arc::new(RolePermissionManager::default()));

        let service = Arc::new(TrustedApplicationService::new(
            Arc::clone(&manager),
            permissions,
            Arc::new(validator),
            provider,
        ));
        let current_app = Arc::new(CurrentApplicationStore::new(
            properties,
            self.config.server_id.clone(),
            self.config.key_bits,
        ));

        Ok(AppState {
            service,
            manager,
            current_app,
        })
    }
}
