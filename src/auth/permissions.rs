// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission boundary for trusted application administration.

use super::roles::Role;
use super::user::AuthenticatedUser;

/// Decides whether a user may administer trusted applications.
///
/// One predicate covers every operation; there is no per-record variance.
pub trait PermissionManager: Send + Sync {
    /// `None` is an anonymous caller.
    fn has_administer_permission(&self, user: Option<&AuthenticatedUser>) -> bool;
}

/// Grants administration to users holding at least a given role.
#[derive(Debug, Clone, Copy)]
pub struct RolePermissionManager {
    required: Role,
}

impl RolePermissionManager {
    pub fn new(required: Role) -> Self {
        Self { required }
    }
}

impl Default for RolePermissionManager {
    fn default() -> Self {
        Self::new(Role::Admin)
    }
}

impl PermissionManager for RolePermissionManager {
    fn has_administer_permission(&self, user: Option<&AuthenticatedUser>) -> bool {
        user.is_some_and(|user| user.has_role(self.required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requires_admin() {
        let permissions = RolePermissionManager::default();
        let admin = AuthenticatedUser::new("admin", Role::Admin);
        let root = AuthenticatedUser::new("root", Role::SystemAdmin);
        let fred = AuthenticatedUser::new("fred", Role::User);

        assert!(permissions.has_administer_permission(Some(&admin)));
        assert!(permissions.has_administer_permission(Some(&root)));
        assert!(!permissions.has_administer_permission(Some(&fred)));
        assert!(!permissions.has_administer_permission(None));
    }

    #[test]
    fn system_admin_requirement_excludes_admins() {
        let permissions = RolePermissionManager::new(Role::SystemAdmin);
        let admin = AuthenticatedUser::new("admin", Role::Admin);
        assert!(!permissions.has_administer_permission(Some(&admin)));
    }
}
