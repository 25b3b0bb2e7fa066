// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistence boundary: flat entity rows and the ports backends implement.

use serde::{Deserialize, Serialize};

use super::StorageResult;

/// Property key holding this application's id.
pub const PROPERTY_APPLICATION_ID: &str = "trustedapp.uid";

/// Property key holding this application's encoded public key.
pub const PROPERTY_PUBLIC_KEY: &str = "trustedapp.public.key";

/// Property key holding this application's encoded private key.
pub const PROPERTY_PRIVATE_KEY: &str = "trustedapp.private.key";

/// Flat persisted shape of a trusted application.
///
/// Every column except the id and timeout is nullable so rows written by
/// older or hand-edited data still load; the store decides what to do with
/// incomplete rows. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedApplicationRow {
    pub id: i64,
    pub application_id: Option<String>,
    pub name: Option<String>,
    pub public_key: Option<String>,
    pub algorithm: Option<String>,
    pub timeout: i64,
    pub created: Option<i64>,
    pub created_by: Option<String>,
    pub updated: Option<i64>,
    pub updated_by: Option<String>,
    pub ip_match: Option<String>,
    pub url_match: Option<String>,
}

/// Exact-match lookup column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMatch<'a> {
    Id(i64),
    ApplicationId(&'a str),
}

impl FieldMatch<'_> {
    pub fn matches(&self, row: &TrustedApplicationRow) -> bool {
        match self {
            FieldMatch::Id(id) => row.id == *id,
            FieldMatch::ApplicationId(application_id) => {
                row.application_id.as_deref() == Some(*application_id)
            }
        }
    }
}

/// Generic entity store over [`TrustedApplicationRow`]s.
pub trait EntityStore: Send + Sync {
    /// All rows, ordered by id.
    fn find_all(&self) -> StorageResult<Vec<TrustedApplicationRow>>;

    /// First row whose column equals the given value.
    fn find_by(&self, field: FieldMatch<'_>) -> StorageResult<Option<TrustedApplicationRow>>;

    /// Insert a row and return it as stored.
    ///
    /// A row with `id < 1` is assigned the next id from a sequence that never
    /// hands out the same value twice. A row with an explicit id is written
    /// under that id and the sequence is moved past it.
    fn insert(&self, row: TrustedApplicationRow) -> StorageResult<TrustedApplicationRow>;

    /// Replace the row with the same id. Returns `false` if there is none.
    fn update(&self, row: &TrustedApplicationRow) -> StorageResult<bool>;

    /// Remove the row with the given id. Returns `false` if there is none.
    fn remove(&self, id: i64) -> StorageResult<bool>;
}

/// String key/value settings.
pub trait PropertyStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Write several entries at once. Either all of them land or none do.
    fn set_all(&self, entries: &[(&str, &str)]) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}
