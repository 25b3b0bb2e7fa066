// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Well-formedness checks on a single candidate.

use url::Url;

use crate::error::{ErrorCollection, Field, Reason};
use crate::keys::{decode_public_key, PublicKey};
use crate::models::TrustedApplicationCandidate;
use crate::patterns::{IpMatcher, UrlMatcher};

use super::TrustedApplicationValidator;

/// Schemes a peer base URL may use.
const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntacticValidator;

impl SyntacticValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check the base URL entered for the register-by-URL flow.
    ///
    /// Surrounding whitespace is an error, not something to trim.
    pub fn validate_base_url(&self, errors: &mut ErrorCollection, base_url: &str) -> bool {
        let problem = if base_url.trim().is_empty() {
            Some("Base URL must not be blank".to_string())
        } else if base_url.trim() != base_url {
            Some("Base URL must not have leading or trailing whitespace".to_string())
        } else {
            match Url::parse(base_url) {
                Ok(url) if !ALLOWED_SCHEMES.contains(&url.scheme()) => {
                    Some(format!("Unsupported URL scheme '{}'", url.scheme()))
                }
                Ok(url) if url.host_str().is_none_or(str::is_empty) => {
                    Some("Base URL must name a host".to_string())
                }
                Ok(_) => None,
                Err(e) => Some(format!("Invalid base URL: {e}")),
            }
        };

        match problem {
            Some(message) => {
                errors.add_error_with_reason(Field::TrustedAppBaseUrl, message, Reason::ValidationFailed);
                false
            }
            None => true,
        }
    }
}

impl TrustedApplicationValidator for SyntacticValidator {
    fn validate(&self, errors: &mut ErrorCollection, candidate: &TrustedApplicationCandidate) -> bool {
        let mut field_errors = ErrorCollection::new();
        let mut fail = |field: Field, message: String| {
            field_errors.add_error_with_reason(field, message, Reason::ValidationFailed);
        };

        if candidate.application_id.trim().is_empty() {
            fail(Field::ApplicationId, "Application id must not be blank".to_string());
        }
        if candidate.name.trim().is_empty() {
            fail(Field::Name, "Name must not be blank".to_string());
        }
        if candidate.timeout <= 0 {
            fail(Field::Timeout, "Timeout must be a positive number of milliseconds".to_string());
        }

        if candidate.public_key.trim().is_empty() {
            fail(Field::PublicKey, "Public key must be provided".to_string());
        } else if let PublicKey::Invalid(invalid) = decode_public_key(&candidate.public_key) {
            fail(Field::PublicKey, format!("Public key is not valid: {}", invalid.reason()));
        }

        if let Some(ip_match) = candidate.ip_match.as_deref() {
            if ip_match.trim().is_empty() {
                fail(Field::IpMatch, "IP match must not be blank".to_string());
            } else if let Err(e) = IpMatcher::parse(Some(ip_match)) {
                fail(Field::IpMatch, e.to_string());
            }
        }

        if let Some(url_match) = candidate.url_match.as_deref() {
            if url_match.trim().is_empty() {
                fail(Field::UrlMatch, "URL match must not be blank".to_string());
            } else if let Err(e) = UrlMatcher::parse(Some(url_match)) {
                fail(Field::UrlMatch, e.to_string());
            }
        }

        let valid = !field_errors.has_any_errors();
        errors.add_error_collection(&field_errors);
        valid
    }
}
