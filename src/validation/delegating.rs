// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ordered, fail-fast composition of validators.

use std::sync::Arc;

use crate::error::ErrorCollection;
use crate::models::TrustedApplicationCandidate;

use super::TrustedApplicationValidator;

/// Runs validators in order and stops at the first one that fails.
#[derive(Clone, Default)]
pub struct DelegatingValidator {
    validators: Vec<Arc<dyn TrustedApplicationValidator>>,
}

impl DelegatingValidator {
    pub fn new(validators: Vec<Arc<dyn TrustedApplicationValidator>>) -> Self {
        Self { validators }
    }

    /// Append a validator to the end of the chain.
    pub fn with(mut self, validator: Arc<dyn TrustedApplicationValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl TrustedApplicationValidator for DelegatingValidator {
    fn validate(&self, errors: &mut ErrorCollection, candidate: &TrustedApplicationCandidate) -> bool {
        self.validators
            .iter()
            .all(|validator| validator.validate(errors, candidate))
    }
}
