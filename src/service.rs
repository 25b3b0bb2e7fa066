// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outward-facing trusted application service.
//!
//! Every operation checks the administer permission first. A denied call
//! adds an error to the caller's [`ServiceContext`] and returns an empty
//! result without touching the manager or the validators.
//!
//! ## Error reporting
//!
//! | Failure | Reported as |
//! |---------|-------------|
//! | permission denied | context error message, `Reason::Forbidden` |
//! | validation failed | context errors, `Reason::ValidationFailed`; `store` also returns `Err(InvalidArgument)` |
//! | storage failure on reads/deletes | context error message, `Reason::ServerError` |
//! | storage failure on `store` | `Err` |
//! | record not found | empty result, no error |

use std::cmp::Ordering;
use std::sync::Arc;

use crate::auth::{AuthenticatedUser, PermissionManager};
use crate::error::{ErrorCollection, Field, Reason, TrustedAppError, TrustedAppResult};
use crate::manager::TrustedApplicationManager;
use crate::models::{
    AuditLog, TrustedApplicationBuilder, TrustedApplicationCandidate, TrustedApplicationInfo,
};
use crate::remote::{ApplicationInfoProvider, RemoteApplicationInfo};
use crate::validation::{SyntacticValidator, TrustedApplicationValidator};

/// User name recorded for anonymous callers.
const ANONYMOUS: &str = "anonymous";

/// Per-call state: the acting user and the errors reported so far.
#[derive(Debug, Clone, Default)]
pub struct ServiceContext {
    user: Option<AuthenticatedUser>,
    errors: ErrorCollection,
}

impl ServiceContext {
    pub fn new(user: AuthenticatedUser) -> Self {
        Self {
            user: Some(user),
            errors: ErrorCollection::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    /// Name that goes into audit stamps.
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map_or(ANONYMOUS, |user| user.user_id.as_str())
    }

    pub fn errors(&self) -> &ErrorCollection {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorCollection {
        &mut self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors.has_any_errors()
    }
}

/// Listing order: name ignoring case, then exact name, application id and
/// numeric id.
pub fn compare_by_name(a: &TrustedApplicationInfo, b: &TrustedApplicationInfo) -> Ordering {
    a.name()
        .to_lowercase()
        .cmp(&b.name().to_lowercase())
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| a.application_id().cmp(b.application_id()))
        .then_with(|| a.id().cmp(&b.id()))
}

pub struct TrustedApplicationService {
    manager: Arc<dyn TrustedApplicationManager>,
    permissions: Arc<dyn PermissionManager>,
    validator: Arc<dyn TrustedApplicationValidator>,
    provider: Arc<dyn ApplicationInfoProvider>,
    base_url_validator: SyntacticValidator,
}

impl TrustedApplicationService {
    pub fn new(
        manager: Arc<dyn TrustedApplicationManager>,
        permissions: Arc<dyn PermissionManager>,
        validator: Arc<dyn TrustedApplicationValidator>,
        provider: Arc<dyn ApplicationInfoProvider>,
    ) -> Self {
        Self {
            manager,
            permissions,
            validator,
            provider,
            base_url_validator: SyntacticValidator::new(),
        }
    }

    fn check_permission(&self, ctx: &mut ServiceContext, action: &str) -> bool {
        if self.permissions.has_administer_permission(ctx.user()) {
            return true;
        }
        tracing::warn!(user = ctx.user_name(), action, "Trusted application access denied");
        ctx.errors_mut().add_error_message_with_reason(
            "You do not have permission to administer trusted applications",
            Reason::Forbidden,
        );
        false
    }

    fn report(ctx: &mut ServiceContext, action: &str, e: TrustedAppError) {
        tracing::error!(action, error = %e, "Trusted application operation failed");
        ctx.errors_mut()
            .add_error_message_with_reason(format!("Could not {action}: {e}"), Reason::ServerError);
    }

    /// All trusted applications, sorted with [`compare_by_name`].
    pub fn get_all(&self, ctx: &mut ServiceContext) -> Vec<Arc<TrustedApplicationInfo>> {
        if !self.check_permission(ctx, "list") {
            return Vec::new();
        }
        match self.manager.get_all() {
            Ok(mut all) => {
                all.sort_by(|a, b| compare_by_name(a, b));
                all
            }
            Err(e) => {
                Self::report(ctx, "list trusted applications", e);
                Vec::new()
            }
        }
    }

    /// Look up by application id.
    pub fn get(&self, ctx: &mut ServiceContext, application_id: &str) -> Option<Arc<TrustedApplicationInfo>> {
        if !self.check_permission(ctx, "get") {
            return None;
        }
        self.manager
            .get_by_application_id(application_id)
            .unwrap_or_else(|e| {
                Self::report(ctx, "load trusted application", e);
                None
            })
    }

    pub fn get_by_id(&self, ctx: &mut ServiceContext, id: i64) -> Option<Arc<TrustedApplicationInfo>> {
        if !self.check_permission(ctx, "get") {
            return None;
        }
        self.manager.get_by_id(id).unwrap_or_else(|e| {
            Self::report(ctx, "load trusted application", e);
            None
        })
    }

    pub fn delete(&self, ctx: &mut ServiceContext, id: i64) -> bool {
        if !self.check_permission(ctx, "delete") {
            return false;
        }
        let user = ctx.user_name().to_string();
        self.manager.delete(&user, id).unwrap_or_else(|e| {
            Self::report(ctx, "delete trusted application", e);
            false
        })
    }

    pub fn delete_by_application_id(&self, ctx: &mut ServiceContext, application_id: &str) -> bool {
        if !self.check_permission(ctx, "delete") {
            return false;
        }
        let user = ctx.user_name().to_string();
        self.manager
            .delete_by_application_id(&user, application_id)
            .unwrap_or_else(|e| {
                Self::report(ctx, "delete trusted application", e);
                false
            })
    }

    /// Run the validation pipeline; failures land in the context.
    pub fn validate(&self, ctx: &mut ServiceContext, candidate: &TrustedApplicationCandidate) -> bool {
        if !self.check_permission(ctx, "validate") {
            return false;
        }
        self.validator.validate(ctx.errors_mut(), candidate)
    }

    /// Validate and persist a candidate.
    ///
    /// Returns `Ok(None)` when permission is denied (reported in `ctx`) and
    /// `Err(InvalidArgument)` when validation fails.
    pub fn store(
        &self,
        ctx: &mut ServiceContext,
        candidate: &TrustedApplicationCandidate,
    ) -> TrustedAppResult<Option<Arc<TrustedApplicationInfo>>> {
        if !self.check_permission(ctx, "store") {
            return Ok(None);
        }

        let mut errors = ErrorCollection::new();
        let valid = self.validator.validate(&mut errors, candidate);
        ctx.errors_mut().add_error_collection(&errors);
        if !valid {
            return Err(TrustedAppError::invalid_argument(format!(
                "trusted application '{}' failed validation: {errors}",
                candidate.application_id
            )));
        }

        let user = ctx.user_name().to_string();
        let stamp = AuditLog::now(user.as_str());
        let info = TrustedApplicationBuilder::from_candidate(candidate)
            .with_created(stamp.clone())
            .with_updated(stamp)
            .to_info()?;
        self.manager.store(&user, &info).map(Some)
    }

    /// Fetch a peer's identity from its base URL, ready to prefill a
    /// candidate.
    pub fn request_application_info(
        &self,
        ctx: &mut ServiceContext,
        base_url: &str,
    ) -> Option<RemoteApplicationInfo> {
        if !self.check_permission(ctx, "request application info") {
            return None;
        }
        if !self.base_url_validator.validate_base_url(ctx.errors_mut(), base_url) {
            return None;
        }

        match self.provider.fetch(base_url) {
            Ok(info) => {
                tracing::info!(base_url, application_id = %info.application_id, "Fetched peer identity");
                Some(info)
            }
            Err(e) => {
                tracing::warn!(base_url, error = %e, "Could not fetch peer identity");
                ctx.errors_mut().add_error_with_reason(
                    Field::TrustedAppEndpoint,
                    format!("Could not retrieve application details from {base_url}: {e}"),
                    Reason::ValidationFailed,
                );
                None
            }
        }
    }
}
