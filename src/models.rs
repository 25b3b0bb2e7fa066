// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted application records.
//!
//! One entity, two projections:
//!
//! - [`TrustedApplicationData`] is persistence-shaped: the public key is kept
//!   as its encoded text.
//! - [`TrustedApplicationInfo`] is service-shaped: the public key is decoded
//!   (possibly into the invalid-key sentinel) and request certificates can be
//!   verified against it.
//!
//! Both are immutable. [`TrustedApplicationBuilder`] converts between them,
//! from storage rows, and from scratch.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TrustedAppError, TrustedAppResult};
use crate::keys::{self, CertificateError, EncodedCertificate, KeyError, PublicKey};
use crate::patterns::{IpMatcher, UrlMatcher};
use crate::storage::TrustedApplicationRow;

/// Accepted clock difference between peers, in milliseconds.
pub const CLOCK_SKEW_MILLIS: i64 = 60_000;

/// Who changed a record, and when.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditLog {
    who: String,
    when: DateTime<Utc>,
}

impl AuditLog {
    /// Create an audit stamp. `when` is truncated to millisecond precision,
    /// the precision the backing store keeps.
    pub fn new(who: impl Into<String>, when: DateTime<Utc>) -> Self {
        let when = DateTime::from_timestamp_millis(when.timestamp_millis()).unwrap_or(when);
        Self {
            who: who.into(),
            when,
        }
    }

    /// Stamp `who` at the current time.
    pub fn now(who: impl Into<String>) -> Self {
        Self::new(who, Utc::now())
    }

    pub fn who(&self) -> &str {
        &self.who
    }

    pub fn when(&self) -> DateTime<Utc> {
        self.when
    }
}

/// Canonicalise a newline-delimited pattern list.
///
/// `\r\n` and `\r` become `\n`; blank input means "no restriction".
pub fn canonicalize_match_list(list: Option<&str>) -> Option<String> {
    let list = list?;
    if list.trim().is_empty() {
        return None;
    }
    Some(list.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Persistence-shaped trusted application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedApplicationData {
    id: i64,
    application_id: String,
    name: String,
    public_key: String,
    timeout: i64,
    ip_match: Option<String>,
    url_match: Option<String>,
    created: AuditLog,
    updated: AuditLog,
}

impl TrustedApplicationData {
    /// Numeric surrogate id; values below 1 mean "not yet persisted".
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encoded public key text, exactly as stored.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Certificate validity window in milliseconds.
    pub fn timeout(&self) -> i64 {
        self.timeout
    }

    pub fn ip_match(&self) -> Option<&str> {
        self.ip_match.as_deref()
    }

    pub fn url_match(&self) -> Option<&str> {
        self.url_match.as_deref()
    }

    pub fn created(&self) -> &AuditLog {
        &self.created
    }

    pub fn updated(&self) -> &AuditLog {
        &self.updated
    }

    pub fn is_persisted(&self) -> bool {
        self.id >= 1
    }

    /// Flatten into a storage row.
    pub fn to_row(&self) -> TrustedApplicationRow {
        TrustedApplicationRow {
            id: self.id,
            application_id: Some(self.application_id.clone()),
            name: Some(self.name.clone()),
            public_key: Some(self.public_key.clone()),
            algorithm: Some(keys::decode_public_key(&self.public_key).algorithm().to_string()),
            timeout: self.timeout,
            created: Some(self.created.when.timestamp_millis()),
            created_by: Some(self.created.who.clone()),
            updated: Some(self.updated.when.timestamp_millis()),
            updated_by: Some(self.updated.who.clone()),
            ip_match: self.ip_match.clone(),
            url_match: self.url_match.clone(),
        }
    }
}

/// Service-shaped trusted application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedApplicationInfo {
    id: i64,
    application_id: String,
    name: String,
    public_key: PublicKey,
    timeout: i64,
    ip_match: Option<String>,
    url_match: Option<String>,
    created: AuditLog,
    updated: AuditLog,
}

/// The parts of an incoming request checked against a record's policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub remote_addr: IpAddr,
    pub path: String,
}

impl IncomingRequest {
    pub fn new(remote_addr: IpAddr, path: impl Into<String>) -> Self {
        Self {
            remote_addr,
            path: path.into(),
        }
    }
}

impl TrustedApplicationInfo {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn timeout(&self) -> i64 {
        self.timeout
    }

    pub fn ip_match(&self) -> Option<&str> {
        self.ip_match.as_deref()
    }

    pub fn url_match(&self) -> Option<&str> {
        self.url_match.as_deref()
    }

    pub fn created(&self) -> &AuditLog {
        &self.created
    }

    pub fn updated(&self) -> &AuditLog {
        &self.updated
    }

    pub fn is_persisted(&self) -> bool {
        self.id >= 1
    }

    /// Whether the stored public key decoded to a usable RSA key.
    pub fn is_valid_key(&self) -> bool {
        self.public_key.is_valid()
    }

    /// Check a certificate presented by this application.
    ///
    /// Checks run in order: issuer id, key usability, signature, age, client
    /// address, request path.
    pub fn verify(
        &self,
        certificate: &EncodedCertificate,
        request: &IncomingRequest,
        now: DateTime<Utc>,
    ) -> Result<(), CertificateError> {
        if certificate.application_id != self.application_id {
            return Err(CertificateError::ApplicationMismatch {
                expected: self.application_id.clone(),
                found: certificate.application_id.clone(),
            });
        }

        certificate.verify_signature(&self.public_key)?;

        let age_millis = now.timestamp_millis() - certificate.issued_at;
        if age_millis < -CLOCK_SKEW_MILLIS {
            return Err(CertificateError::NotYetValid);
        }
        if age_millis > self.timeout {
            return Err(CertificateError::Expired {
                age_millis,
                timeout_millis: self.timeout,
            });
        }

        let ip_allowed = IpMatcher::parse(self.ip_match())
            .map(|matcher| matcher.matches(request.remote_addr))
            .unwrap_or(false);
        if !ip_allowed {
            return Err(CertificateError::IpNotAllowed(request.remote_addr.to_string()));
        }

        let url_allowed = UrlMatcher::parse(self.url_match())
            .map(|matcher| matcher.matches(&request.path))
            .unwrap_or(false);
        if !url_allowed {
            return Err(CertificateError::UrlNotAllowed(request.path.clone()));
        }

        Ok(())
    }
}

/// A prospective write as submitted by an administrator, before validation.
///
/// Fields are raw: nothing has been checked or canonicalised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedApplicationCandidate {
    pub id: i64,
    pub application_id: String,
    pub name: String,
    pub public_key: String,
    pub timeout: i64,
    pub ip_match: Option<String>,
    pub url_match: Option<String>,
}

impl TrustedApplicationCandidate {
    /// Candidate describing an existing record, e.g. to re-validate an edit.
    pub fn from_info(info: &TrustedApplicationInfo) -> Result<Self, KeyError> {
        Ok(Self {
            id: info.id,
            application_id: info.application_id.clone(),
            name: info.name.clone(),
            public_key: keys::encode_public_key(&info.public_key)?,
            timeout: info.timeout,
            ip_match: info.ip_match.clone(),
            url_match: info.url_match.clone(),
        })
    }
}

/// Mutable builder for trusted application records.
#[derive(Debug, Clone, Default)]
pub struct TrustedApplicationBuilder {
    id: i64,
    application_id: Option<String>,
    name: Option<String>,
    public_key: Option<PublicKey>,
    timeout: i64,
    ip_match: Option<String>,
    url_match: Option<String>,
    created: Option<AuditLog>,
    updated: Option<AuditLog>,
}

impl TrustedApplicationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a persisted record.
    pub fn from_data(data: &TrustedApplicationData) -> Self {
        Self {
            id: data.id,
            application_id: Some(data.application_id.clone()),
            name: Some(data.name.clone()),
            public_key: Some(keys::decode_public_key(&data.public_key)),
            timeout: data.timeout,
            ip_match: data.ip_match.clone(),
            url_match: data.url_match.clone(),
            created: Some(data.created.clone()),
            updated: Some(data.updated.clone()),
        }
    }

    /// Start from a service-level record.
    pub fn from_info(info: &TrustedApplicationInfo) -> Self {
        Self {
            id: info.id,
            application_id: Some(info.application_id.clone()),
            name: Some(info.name.clone()),
            public_key: Some(info.public_key.clone()),
            timeout: info.timeout,
            ip_match: info.ip_match.clone(),
            url_match: info.url_match.clone(),
            created: Some(info.created.clone()),
            updated: Some(info.updated.clone()),
        }
    }

    /// Start from a raw storage row. Absent columns stay unset.
    pub fn from_row(row: &TrustedApplicationRow) -> Self {
        let stamp = |who: &Option<String>, when: Option<i64>| match (who, when) {
            (Some(who), Some(when)) => {
                DateTime::from_timestamp_millis(when).map(|when| AuditLog::new(who.clone(), when))
            }
            _ => None,
        };

        Self {
            id: row.id,
            application_id: row.application_id.clone(),
            name: row.name.clone(),
            public_key: row.public_key.as_deref().map(keys::decode_public_key),
            timeout: row.timeout,
            ip_match: canonicalize_match_list(row.ip_match.as_deref()),
            url_match: canonicalize_match_list(row.url_match.as_deref()),
            created: stamp(&row.created_by, row.created),
            updated: stamp(&row.updated_by, row.updated),
        }
    }

    /// Start from a candidate. Audit stamps are left unset.
    pub fn from_candidate(candidate: &TrustedApplicationCandidate) -> Self {
        Self::new()
            .with_id(candidate.id)
            .with_application_id(candidate.application_id.clone())
            .with_name(candidate.name.clone())
            .with_public_key(keys::decode_public_key(&candidate.public_key))
            .with_timeout(candidate.timeout)
            .with_ip_match(candidate.ip_match.as_deref())
            .with_url_match(candidate.url_match.as_deref())
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_public_key(mut self, public_key: PublicKey) -> Self {
        self.public_key = Some(public_key);
        self
    }

    /// Set the public key from its encoded text; bad text yields the sentinel.
    pub fn with_encoded_public_key(self, encoded: &str) -> Self {
        self.with_public_key(keys::decode_public_key(encoded))
    }

    pub fn with_timeout(mut self, timeout_millis: i64) -> Self {
        self.timeout = timeout_millis;
        self
    }

    pub fn with_ip_match(mut self, ip_match: Option<&str>) -> Self {
        self.ip_match = canonicalize_match_list(ip_match);
        self
    }

    pub fn with_url_match(mut self, url_match: Option<&str>) -> Self {
        self.url_match = canonicalize_match_list(url_match);
        self
    }

    pub fn with_created(mut self, created: AuditLog) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_updated(mut self, updated: AuditLog) -> Self {
        self.updated = Some(updated);
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn created(&self) -> Option<&AuditLog> {
        self.created.as_ref()
    }

    pub fn updated(&self) -> Option<&AuditLog> {
        self.updated.as_ref()
    }

    pub fn to_data(&self) -> TrustedAppResult<TrustedApplicationData> {
        let (application_id, name, public_key) = self.required()?;
        let (created, updated) = self.audit()?;
        Ok(TrustedApplicationData {
            id: self.id,
            application_id,
            name,
            public_key: keys::encode_public_key(&public_key)?,
            timeout: self.timeout,
            ip_match: self.ip_match.clone(),
            url_match: self.url_match.clone(),
            created,
            updated,
        })
    }

    pub fn to_info(&self) -> TrustedAppResult<TrustedApplicationInfo> {
        let (application_id, name, public_key) = self.required()?;
        let (created, updated) = self.audit()?;
        Ok(TrustedApplicationInfo {
            id: self.id,
            application_id,
            name,
            public_key,
            timeout: self.timeout,
            ip_match: self.ip_match.clone(),
            url_match: self.url_match.clone(),
            created,
            updated,
        })
    }

    fn required(&self) -> TrustedAppResult<(String, String, PublicKey)> {
        let application_id = self
            .application_id
            .clone()
            .ok_or_else(|| TrustedAppError::invalid_argument("applicationId must not be null"))?;
        let name = self
            .name
            .clone()
            .ok_or_else(|| TrustedAppError::invalid_argument("name must not be null"))?;
        let public_key = self
            .public_key
            .clone()
            .ok_or_else(|| TrustedAppError::invalid_argument("publicKey must not be null"))?;
        Ok((application_id, name, public_key))
    }

    fn audit(&self) -> TrustedAppResult<(AuditLog, AuditLog)> {
        match (&self.created, &self.updated) {
            (Some(created), Some(updated)) => Ok((created.clone(), updated.clone())),
            (None, _) => Err(TrustedAppError::illegal_state("created audit log not set")),
            (_, None) => Err(TrustedAppError::illegal_state("updated audit log not set")),
        }
    }
}
