// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Register-by-URL: fetch a peer application's id and public key.
//!
//! A peer publishes its trust certificate at
//! `{base}/admin/appTrustCertificate` as plain text: the application id on
//! the first non-empty line, the encoded public key on the second.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::keys::{decode_public_key, PublicKey};

/// Path of the trust certificate relative to a peer's base URL.
pub const CERTIFICATE_PATH: &str = "admin/appTrustCertificate";

/// Identity published by a peer application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteApplicationInfo {
    pub application_id: String,
    pub public_key: PublicKey,
    /// Key text exactly as published
    pub encoded_public_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("peer returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed trust certificate: {0}")]
    Malformed(String),
}

/// Source of peer identities.
pub trait ApplicationInfoProvider: Send + Sync {
    fn fetch(&self, base_url: &str) -> Result<RemoteApplicationInfo, RemoteError>;
}

/// Fetches trust certificates over HTTP(S).
pub struct HttpApplicationInfoProvider {
    http: Client,
}

impl HttpApplicationInfoProvider {
    pub fn new(timeout: Duration) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

impl ApplicationInfoProvider for HttpApplicationInfoProvider {
    fn fetch(&self, base_url: &str) -> Result<RemoteApplicationInfo, RemoteError> {
        let url = format!("{}/{CERTIFICATE_PATH}", base_url.trim_end_matches('/'));
        tracing::debug!(%url, "Fetching trust certificate");

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        let body = response
            .text()
            .map_err(|e| RemoteError::Request(format!("failed to read response: {e}")))?;
        parse_certificate(&body)
    }
}

/// Parse a published trust certificate body.
pub fn parse_certificate(body: &str) -> Result<RemoteApplicationInfo, RemoteError> {
    let mut lines = body.lines().map(str::trim).filter(|line| !line.is_empty());
    let application_id = lines
        .next()
        .ok_or_else(|| RemoteError::Malformed("missing application id".to_string()))?;
    let encoded_public_key = lines
        .next()
        .ok_or_else(|| RemoteError::Malformed("missing public key".to_string()))?;

    let public_key = decode_public_key(encoded_public_key);
    if let PublicKey::Invalid(invalid) = &public_key {
        return Err(RemoteError::Malformed(format!(
            "public key is not valid: {}",
            invalid.reason()
        )));
    }

    Ok(RemoteApplicationInfo {
        application_id: application_id.to_string(),
        public_key,
        encoded_public_key: encoded_public_key.to_string(),
    })
}
