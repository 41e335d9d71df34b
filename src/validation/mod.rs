//! Field validation capability consumed by the wizard.
//!
//! The wizard never decides what makes a value valid. It only decides
//! *which* fields get validated and *when*: the subset owned by the step
//! being left, or a single field on blur.

mod rules;

pub use rules::{FieldRules, RuleValidator};

use async_trait::async_trait;

use crate::answers::{AnswerSet, FieldErrors};

/// Validates a named subset of fields.
///
/// Implementations receive exactly the keys being validated (missing values
/// arrive as `Null`) and return an error message per failing key. An empty
/// map means every field passed.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, subset: &AnswerSet) -> FieldErrors;
}

/// Validator that accepts everything. Useful for flows without rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl Validator for AcceptAll {
    async fn validate(&self, _subset: &AnswerSet) -> FieldErrors {
        FieldErrors::new()
    }
}
