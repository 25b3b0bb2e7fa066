// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Acting user representation.

use serde::{Deserialize, Serialize};

use super::roles::Role;

/// The user a service call is made on behalf of.
///
/// `user_id` is what ends up in audit stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Canonical user name
    pub user_id: String,

    /// User's role
    pub role: Role,

    /// Session ID (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Check if the user has the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }

    /// Check if this user may administer the application.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}
