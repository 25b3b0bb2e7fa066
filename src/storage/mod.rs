// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage
//!
//! Persistence for the trusted application registry.
//!
//! ## Layers
//!
//! ```text
//! CachingTrustedApplicationStore   (snapshot cache, reload on mutation)
//!   DefaultTrustedApplicationStore (rows <-> TrustedApplicationData)
//!     EntityStore                  (MemoryDatabase | RedbDatabase)
//! ```
//!
//! The same backends also implement [`PropertyStore`], which holds this
//! application's own id and key pair.

pub mod caching;
pub mod database;
pub mod entity;
pub mod memory;
pub mod trusted_apps;

pub use caching::CachingTrustedApplicationStore;
pub use database::{RedbDatabase, StorageError, StorageResult};
pub use entity::{
    EntityStore, FieldMatch, PropertyStore, TrustedApplicationRow, PROPERTY_APPLICATION_ID,
    PROPERTY_PRIVATE_KEY, PROPERTY_PUBLIC_KEY,
};
pub use memory::MemoryDatabase;
pub use trusted_apps::{DefaultTrustedApplicationStore, TrustedApplicationStore};
