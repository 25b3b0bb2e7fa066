// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Validation pipeline for prospective writes.
//!
//! ```text
//! DelegatingValidator
//!   SyntacticValidator   candidate in isolation
//!   SemanticValidator    candidate against the registry
//!   ...                  plugin validators, in the order supplied
//! ```
//!
//! Validators report into an [`ErrorCollection`] and return whether the
//! candidate passed. They never fail with an error value.

pub mod delegating;
pub mod semantic;
pub mod syntactic;

use crate::error::ErrorCollection;
use crate::models::TrustedApplicationCandidate;

pub use delegating::DelegatingValidator;
pub use semantic::SemanticValidator;
pub use syntactic::SyntacticValidator;

/// One stage of the pipeline.
pub trait TrustedApplicationValidator: Send + Sync {
    /// Returns `true` if `candidate` passed. Failures are added to `errors`.
    fn validate(&self, errors: &mut ErrorCollection, candidate: &TrustedApplicationCandidate) -> bool;
}
