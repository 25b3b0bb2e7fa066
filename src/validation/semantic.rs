// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Consistency checks of a candidate against the registry.

use std::sync::Arc;

use crate::error::{ErrorCollection, Reason, TrustedAppError};
use crate::manager::TrustedApplicationManager;
use crate::models::TrustedApplicationCandidate;

use super::TrustedApplicationValidator;

/// Enforces application id uniqueness and stable id ↔ application id pairing.
pub struct SemanticValidator {
    manager: Arc<dyn TrustedApplicationManager>,
}

impl SemanticValidator {
    pub fn new(manager: Arc<dyn TrustedApplicationManager>) -> Self {
        Self { manager }
    }

    fn lookup_failed(errors: &mut ErrorCollection, e: TrustedAppError) -> bool {
        tracing::error!(error = %e, "Registry lookup failed during validation");
        errors.add_error_message_with_reason(
            format!("Could not check the trusted application registry: {e}"),
            Reason::ServerError,
        );
        false
    }
}

impl TrustedApplicationValidator for SemanticValidator {
    fn validate(&self, errors: &mut ErrorCollection, candidate: &TrustedApplicationCandidate) -> bool {
        let owner = match self.manager.get_by_application_id(&candidate.application_id) {
            Ok(owner) => owner,
            Err(e) => return Self::lookup_failed(errors, e),
        };
        if let Some(owner) = owner {
            if owner.id() != candidate.id {
                errors.add_error_message_with_reason(
                    format!(
                        "Application id '{}' is already taken by another trusted application",
                        candidate.application_id
                    ),
                    Reason::ValidationFailed,
                );
                return false;
            }
        }

        if candidate.id >= 1 {
            let existing = match self.manager.get_by_id(candidate.id) {
                Ok(existing) => existing,
                Err(e) => return Self::lookup_failed(errors, e),
            };
            match existing {
                None => {
                    errors.add_error_message_with_reason(
                        format!("No trusted application with id {} exists", candidate.id),
                        Reason::ValidationFailed,
                    );
                    return false;
                }
                Some(existing) if existing.application_id() != candidate.application_id => {
                    errors.add_error_message_with_reason(
                        format!(
                            "Trusted application {} is registered as '{}' and its application id cannot change",
                            candidate.id,
                            existing.application_id()
                        ),
                        Reason::ValidationFailed,
                    );
                    return false;
                }
                Some(_) => {}
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Field;
    use crate::manager::DefaultTrustedApplicationManager;
    use crate::storage::{DefaultTrustedApplicationStore, MemoryDatabase};
    use crate::test_support::{candidate, info_builder, test_key_pair};

    /// Registry holding `{id: 1, applicationId: "appId"}`.
    fn validator() -> SemanticValidator {
        let store = DefaultTrustedApplicationStore::new(Arc::new(MemoryDatabase::new()));
        let manager = DefaultTrustedApplicationManager::new(Arc::new(store));
        let stored = manager
            .store("admin", &info_builder("appId", &test_key_pair().public).to_info().unwrap())
            .unwrap();
        assert_eq!(stored.id(), 1);
        SemanticValidator::new(Arc::new(manager))
    }

    fn check(validator: &SemanticValidator, id: i64, application_id: &str) -> (bool, ErrorCollection) {
        let mut errors = ErrorCollection::new();
        let valid = validator.validate(&mut errors, &candidate(id, application_id));
        (valid, errors)
    }

    #[test]
    fn new_candidate_with_taken_id_fails() {
        let (valid, errors) = check(&validator(), 0, "appId");
        assert!(!valid);
        assert_eq!(errors.error_messages().len(), 1);
        assert!(errors.errors().is_empty());
        assert!(errors.has_reason(Reason::ValidationFailed));
    }

    #[test]
    fn new_candidate_with_free_id_passes() {
        let (valid, errors) = check(&validator(), 0, "otherId");
        assert!(valid);
        assert!(!errors.has_any_errors());
    }

    #[test]
    fn other_record_claiming_taken_id_fails() {
        let (valid, _) = check(&validator(), 2, "appId");
        assert!(!valid);
    }

    #[test]
    fn editing_own_record_passes() {
        let (valid, errors) = check(&validator(), 1, "appId");
        assert!(valid, "{errors}");
    }

    #[test]
    fn renaming_application_id_fails() {
        let (valid, errors) = check(&validator(), 1, "otherId");
        assert!(!valid);
        assert!(errors.error_messages()[0].contains("cannot change"));
        assert!(errors.error(Field::ApplicationId).is_none());
    }

    #[test]
    fn unknown_numeric_id_fails() {
        let (valid, errors) = check(&validator(), 5, "otherId");
        assert!(!valid);
        assert!(errors.error_messages()[0].contains("No trusted application"));
    }
}
