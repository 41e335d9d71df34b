//! Typed error hierarchy for the onboarding wizard engine.
//!
//! The enums map onto the failure classes the engine distinguishes:
//! - `WizardError`: transition and submission failures returned to the view layer
//! - `PersistenceError`: draft store failures (always degraded, never fatal)
//! - `SubmissionError`: the transport's typed failure, surfaced verbatim
//! - `RegistryError` / `FlowError`: invalid step or flow definitions

use thiserror::Error;

use crate::answers::FieldErrors;
use crate::wizard::Position;

/// Errors returned by wizard transitions and the submission coordinator.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Unknown step {index} (flow has {count} steps)")]
    UnknownStep { index: usize, count: usize },

    #[error("Cannot navigate to {target}")]
    InvalidTarget { target: Position },

    #[error("Step '{step}' has {} invalid field(s)", errors.len())]
    ValidationFailed { step: String, errors: FieldErrors },

    #[error("Steps can only be edited from the review screen")]
    NotInReview,

    #[error("There is no step before '{step}'")]
    NoPreviousStep { step: String },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("This wizard has already been submitted")]
    AlreadySubmitted,

    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),
}

impl WizardError {
    /// Field errors carried by a validation failure, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            WizardError::ValidationFailed { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

/// Failure reported by a submission transport.
///
/// The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmissionError {
    pub message: String,
}

impl SubmissionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from draft stores and draft decoding.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to access draft '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Draft '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Draft '{key}' is incompatible: {reason}")]
    Incompatible { key: String, reason: String },

    #[error("Failed to serialize draft: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors raised while building a step registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A wizard needs at least one step")]
    Empty,

    #[error("Step name '{0}' is used more than once")]
    DuplicateStepName(String),

    #[error("Step name '{0}' is reserved for the review screen")]
    ReservedStepName(String),

    #[error("Step name '{0}' must only contain lowercase letters, digits, '-' or '_'")]
    InvalidStepName(String),

    #[error("Field '{key}' is owned by both '{first}' and '{second}'")]
    DuplicateField {
        key: String,
        first: String,
        second: String,
    },
}

/// Errors raised while loading or building a flow definition.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid pattern for field '{key}': {source}")]
    InvalidPattern {
        key: String,
        #[source]
        source: regex::Error,
    },

    #[error("Select field '{0}' has no options")]
    MissingOptions(String),

    #[error("Identity field '{0}' is not owned by any step")]
    UnknownIdentityField(String),

    #[error("Failed to parse flow definition: {0}")]
    Parse(#[from] toml::de::Error),
}
