// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `SystemAdmin` - Everything, including server-level settings
/// - `Admin` - Administers applications, trusted applications included
/// - `User` - Regular user, no administrative access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full system administration
    SystemAdmin,
    /// Application administration
    Admin,
    /// Regular user
    User,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            // System admin can do anything
            (Role::SystemAdmin, _) => true,
            (Role::Admin, Role::Admin | Role::User) => true,
            (Role::User, Role::User) => true,
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "system_admin" | "sysadmin" => Some(Role::SystemAdmin),
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is User (least privilege).
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::SystemAdmin => write!(f, "system_admin"),
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}
