// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Service-level access to trusted applications.
//!
//! The manager speaks [`TrustedApplicationInfo`], stamps audit logs on every
//! write and delegates persistence to a
//! [`TrustedApplicationStore`](crate::storage::TrustedApplicationStore).

pub mod caching;
pub mod default;

use std::sync::Arc;

use crate::error::TrustedAppResult;
use crate::models::TrustedApplicationInfo;

pub use caching::CachingTrustedApplicationManager;
pub use default::DefaultTrustedApplicationManager;

/// Manager port.
pub trait TrustedApplicationManager: Send + Sync {
    fn get_all(&self) -> TrustedAppResult<Vec<Arc<TrustedApplicationInfo>>>;

    fn get_by_id(&self, id: i64) -> TrustedAppResult<Option<Arc<TrustedApplicationInfo>>>;

    fn get_by_application_id(
        &self,
        application_id: &str,
    ) -> TrustedAppResult<Option<Arc<TrustedApplicationInfo>>>;

    /// Persist `info` on behalf of `user`.
    ///
    /// `updated` is always `(user, now)`. `created` is `(user, now)` for a new
    /// record and the stored value otherwise; whatever stamps `info` carries
    /// are ignored.
    fn store(
        &self,
        user: &str,
        info: &TrustedApplicationInfo,
    ) -> TrustedAppResult<Arc<TrustedApplicationInfo>>;

    fn delete(&self, user: &str, id: i64) -> TrustedAppResult<bool>;

    fn delete_by_application_id(&self, user: &str, application_id: &str) -> TrustedAppResult<bool>;
}
