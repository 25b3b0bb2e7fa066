// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Module
//!
//! Who is acting, and whether they may administer trusted applications.
//!
//! Authentication itself happens upstream; callers hand the service an
//! already-resolved [`AuthenticatedUser`] (or `None` for anonymous calls).

pub mod permissions;
pub mod roles;
pub mod user;

pub use permissions::{PermissionManager, RolePermissionManager};
pub use roles::Role;
pub use user::AuthenticatedUser;
