// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy and the accumulating error collection.
//!
//! Two kinds of failure leave this crate:
//!
//! - [`TrustedAppError`] is returned for programmer errors (missing required
//!   arguments, incomplete builders), storage failures and the service-level
//!   `store` validation failure.
//! - [`ErrorCollection`] accumulates user-facing validation and permission
//!   failures. Field errors are keyed by [`Field`], everything else is a
//!   free-form message.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::keys::KeyError;
use crate::storage::StorageError;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum TrustedAppError {
    /// A required argument was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An object was used before it was fully initialised.
    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

impl TrustedAppError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }
}

pub type TrustedAppResult<T> = Result<T, TrustedAppError>;

/// Form fields a validation error can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Field {
    #[serde(rename = "applicationId")]
    ApplicationId,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "timeout")]
    Timeout,
    #[serde(rename = "publicKey")]
    PublicKey,
    #[serde(rename = "ipMatch")]
    IpMatch,
    #[serde(rename = "urlMatch")]
    UrlMatch,
    #[serde(rename = "trustedAppBaseUrl")]
    TrustedAppBaseUrl,
    #[serde(rename = "trustedAppEndpoint")]
    TrustedAppEndpoint,
}

impl Field {
    /// Wire name of the field as used by the admin forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ApplicationId => "applicationId",
            Field::Name => "name",
            Field::Timeout => "timeout",
            Field::PublicKey => "publicKey",
            Field::IpMatch => "ipMatch",
            Field::UrlMatch => "urlMatch",
            Field::TrustedAppBaseUrl => "trustedAppBaseUrl",
            Field::TrustedAppEndpoint => "trustedAppEndpoint",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of the errors in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// The acting user may not administer trusted applications.
    Forbidden,
    /// A candidate failed syntactic or semantic validation.
    ValidationFailed,
    /// The backing store failed.
    ServerError,
}

/// Accumulates field-keyed errors and general error messages.
///
/// Adding a second error for the same field replaces the first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorCollection {
    errors: BTreeMap<Field, String>,
    error_messages: Vec<String>,
    reasons: BTreeSet<Reason>,
}

impl ErrorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error attributable to a single field.
    pub fn add_error(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    /// Record an error with a reason attached.
    pub fn add_error_with_reason(&mut self, field: Field, message: impl Into<String>, reason: Reason) {
        self.add_error(field, message);
        self.reasons.insert(reason);
    }

    /// Record a general error message.
    pub fn add_error_message(&mut self, message: impl Into<String>) {
        self.error_messages.push(message.into());
    }

    pub fn add_error_message_with_reason(&mut self, message: impl Into<String>, reason: Reason) {
        self.add_error_message(message);
        self.reasons.insert(reason);
    }

    pub fn add_reason(&mut self, reason: Reason) {
        self.reasons.insert(reason);
    }

    /// Merge every entry of `other` into this collection.
    pub fn add_error_collection(&mut self, other: &ErrorCollection) {
        for (field, message) in &other.errors {
            self.errors.insert(*field, message.clone());
        }
        self.error_messages.extend(other.error_messages.iter().cloned());
        self.reasons.extend(other.reasons.iter().copied());
    }

    pub fn has_any_errors(&self) -> bool {
        !self.errors.is_empty() || !self.error_messages.is_empty()
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    pub fn reasons(&self) -> &BTreeSet<Reason> {
        &self.reasons
    }

    pub fn has_reason(&self, reason: Reason) -> bool {
        self.reasons.contains(&reason)
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        for message in &self.error_messages {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}
