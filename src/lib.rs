// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted Application Registry
//!
//! Keeps the set of peer applications this server trusts for legacy
//! RSA-signed single sign-on, along with this server's own identity.
//!
//! ## Modules
//!
//! - `auth` - Roles, authenticated users and the administer permission
//! - `cache` - Immutable snapshot cache shared by the caching decorators
//! - `config` - Environment configuration
//! - `current` - This application's id and key pair
//! - `keys` - RSA key codec and request certificates
//! - `manager` - Trusted application manager with audit stamping
//! - `models` - Records, builders and request verification
//! - `patterns` - IP and URL restriction matching
//! - `remote` - Register-by-URL certificate fetch
//! - `service` - Permission-checked service facade
//! - `state` - Composition root
//! - `storage` - Entity and property storage (redb, in-memory)
//! - `validation` - Candidate validation pipeline

pub mod auth;
pub mod cache;
pub mod config;
pub mod current;
pub mod error;
pub mod keys;
pub mod manager;
pub mod models;
pub mod patterns;
pub mod remote;
pub mod service;
pub mod state;
pub mod storage;
pub mod validation;

#[cfg(test)]
mod test_support;
