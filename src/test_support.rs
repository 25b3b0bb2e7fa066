// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures and counting test doubles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crate::auth::{AuthenticatedUser, PermissionManager};
use crate::error::{ErrorCollection, Reason, TrustedAppError, TrustedAppResult};
use crate::keys::{generate_key_pair, KeyPair, PublicKey};
use crate::manager::TrustedApplicationManager;
use crate::models::{
    AuditLog, TrustedApplicationBuilder, TrustedApplicationCandidate, TrustedApplicationData,
    TrustedApplicationInfo,
};
use crate::storage::TrustedApplicationStore;
use crate::validation::TrustedApplicationValidator;

/// A 2048-bit RSA public key in X.509 SubjectPublicKeyInfo form.
pub const PUBLIC_KEY_2048: &str = "MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAmoR5oxXiFcvIPNITg1cDHgWs3c8LHDEFWTEJGP5zpJEdcl6+at4o3lXPRvnyU0lt+e2ZR04Wmox5WgrAfJhrx921Z5i45RAEFzw2BSe6wHAC2sz8K5jjnhfI8h4Z62txPODMuJc60Csl+7VDpazDxrhVIqj2qsGe0fGyghQR8wwgo26SJAQnrfWnUym/WzE2PqV/1cBFgpA1FCuvj4pZ2vgn0exMruPZIt3L8KXCac89jTVVJHRPlh9o6v9A2pbV+CqM7MQUOXtBeCSRaMNJk6BJ+4FacuYyepc6QvBw7O/rBL4bEoOcUa3KqF1wRpzmkhapzdFQOZeVRhTmfNlcdwIDAQAB";

/// Key pair generated once per test binary.
pub fn test_key_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate_key_pair(1024).unwrap())
}

/// Complete, unsaved record using [`PUBLIC_KEY_2048`].
pub fn data_builder(application_id: &str) -> TrustedApplicationBuilder {
    TrustedApplicationBuilder::new()
        .with_application_id(application_id)
        .with_name(format!("{application_id} server"))
        .with_encoded_public_key(PUBLIC_KEY_2048)
        .with_timeout(1000)
        .with_created(AuditLog::now("admin"))
        .with_updated(AuditLog::now("admin"))
}

/// Complete, unsaved record with the given key and a 10 second timeout.
pub fn info_builder(application_id: &str, public_key: &PublicKey) -> TrustedApplicationBuilder {
    data_builder(application_id)
        .with_public_key(public_key.clone())
        .with_timeout(10_000)
}

/// Syntactically valid candidate.
pub fn candidate(id: i64, application_id: &str) -> TrustedApplicationCandidate {
    TrustedApplicationCandidate {
        id,
        application_id: application_id.to_string(),
        name: format!("{application_id} server"),
        public_key: PUBLIC_KEY_2048.to_string(),
        timeout: 1000,
        ip_match: None,
        url_match: None,
    }
}

fn injected_failure() -> TrustedAppError {
    TrustedAppError::illegal_state("injected failure")
}

// =============================================================================
// CountingStore
// =============================================================================

/// Store wrapper counting calls per operation.
pub struct CountingStore {
    inner: Arc<dyn TrustedApplicationStore>,
    get_all: AtomicUsize,
    get_by_id: AtomicUsize,
    get_by_application_id: AtomicUsize,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn TrustedApplicationStore>) -> Self {
        Self {
            inner,
            get_all: AtomicUsize::new(0),
            get_by_id: AtomicUsize::new(0),
            get_by_application_id: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// The wrapped store, bypassing the counters.
    pub fn inner(&self) -> &Arc<dyn TrustedApplicationStore> {
        &self.inner
    }

    /// Make `store` and `delete*` fail with `IllegalState`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `get_all` fail with `IllegalState`; writes are unaffected.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn get_all_calls(&self) -> usize {
        self.get_all.load(Ordering::SeqCst)
    }

    pub fn get_by_id_calls(&self) -> usize {
        self.get_by_id.load(Ordering::SeqCst)
    }

    pub fn get_by_application_id_calls(&self) -> usize {
        self.get_by_application_id.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn write(&self) -> TrustedAppResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

impl TrustedApplicationStore for CountingStore {
    fn get_all(&self) -> TrustedAppResult<Vec<Arc<TrustedApplicationData>>> {
        self.get_all.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.inner.get_all()
    }

    fn get_by_id(&self, id: i64) -> TrustedAppResult<Option<Arc<TrustedApplicationData>>> {
        self.get_by_id.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id)
    }

    fn get_by_application_id(
        &self,
        application_id: &str,
    ) -> TrustedAppResult<Option<Arc<TrustedApplicationData>>> {
        self.get_by_application_id.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_application_id(application_id)
    }

    fn store(&self, data: &TrustedApplicationData) -> TrustedAppResult<Arc<TrustedApplicationData>> {
        self.write()?;
        self.inner.store(data)
    }

    fn delete(&self, id: i64) -> TrustedAppResult<bool> {
        self.write()?;
        self.inner.delete(id)
    }

    fn delete_by_application_id(&self, application_id: &str) -> TrustedAppResult<bool> {
        self.write()?;
        self.inner.delete_by_application_id(application_id)
    }
}

// =============================================================================
// CountingManager
// =============================================================================

/// Manager wrapper counting calls per operation.
pub struct CountingManager {
    inner: Arc<dyn TrustedApplicationManager>,
    get_all: AtomicUsize,
    get_by_id: AtomicUsize,
    get_by_application_id: AtomicUsize,
    store: AtomicUsize,
    delete: AtomicUsize,
    fail_all: AtomicBool,
    fail_reads: AtomicBool,
}

impl CountingManager {
    pub fn new(inner: Arc<dyn TrustedApplicationManager>) -> Self {
        Self {
            inner,
            get_all: AtomicUsize::new(0),
            get_by_id: AtomicUsize::new(0),
            get_by_application_id: AtomicUsize::new(0),
            store: AtomicUsize::new(0),
            delete: AtomicUsize::new(0),
            fail_all: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &Arc<dyn TrustedApplicationManager> {
        &self.inner
    }

    /// Make every operation fail with `IllegalState`.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Make only `get_all` fail with `IllegalState`.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn get_all_calls(&self) -> usize {
        self.get_all.load(Ordering::SeqCst)
    }

    pub fn get_by_id_calls(&self) -> usize {
        self.get_by_id.load(Ordering::SeqCst)
    }

    pub fn store_calls(&self) -> usize {
        self.store.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        [
            &self.get_all,
            &self.get_by_id,
            &self.get_by_application_id,
            &self.store,
            &self.delete,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::SeqCst))
        .sum()
    }

    fn count(&self, counter: &AtomicUsize) -> TrustedAppResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

impl TrustedApplicationManager for CountingManager {
    fn get_all(&self) -> TrustedAppResult<Vec<Arc<TrustedApplicationInfo>>> {
        self.count(&self.get_all)?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.inner.get_all()
    }

    fn get_by_id(&self, id: i64) -> TrustedAppResult<Option<Arc<TrustedApplicationInfo>>> {
        self.count(&self.get_by_id)?;
        self.inner.get_by_id(id)
    }

    fn get_by_application_id(
        &self,
        application_id: &str,
    ) -> TrustedAppResult<Option<Arc<TrustedApplicationInfo>>> {
        self.count(&self.get_by_application_id)?;
        self.inner.get_by_application_id(application_id)
    }

    fn store(
        &self,
        user: &str,
        info: &TrustedApplicationInfo,
    ) -> TrustedAppResult<Arc<TrustedApplicationInfo>> {
        self.count(&self.store)?;
        self.inner.store(user, info)
    }

    fn delete(&self, user: &str, id: i64) -> TrustedAppResult<bool> {
        self.count(&self.delete)?;
        self.inner.delete(user, id)
    }

    fn delete_by_application_id(&self, user: &str, application_id: &str) -> TrustedAppResult<bool> {
        self.count(&self.delete)?;
        self.inner.delete_by_application_id(user, application_id)
    }
}

// =============================================================================
// Permissions and validators
// =============================================================================

/// Answers every permission check the same way.
pub struct StaticPermissions(pub bool);

impl PermissionManager for StaticPermissions {
    fn has_administer_permission(&self, _user: Option<&AuthenticatedUser>) -> bool {
        self.0
    }
}

/// Validator with a fixed verdict that counts its invocations.
pub struct CountingValidator {
    result: bool,
    calls: AtomicUsize,
}

impl CountingValidator {
    pub fn new(result: bool) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TrustedApplicationValidator for CountingValidator {
    fn validate(&self, errors: &mut ErrorCollection, _candidate: &TrustedApplicationCandidate) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.result {
            errors.add_error_message_with_reason("rejected by test validator", Reason::ValidationFailed);
        }
        self.result
    }
}
