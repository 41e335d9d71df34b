//! Submission transport: delivers the final answer set.
//!
//! Two implementations ship with the crate:
//! - `HttpTransport`: POSTs the payload as JSON to the portal API
//! - `OutboxTransport`: writes the payload to a local outbox directory

mod http;
mod outbox;

pub use http::HttpTransport;
pub use outbox::OutboxTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::answers::AnswerSet;
use crate::errors::SubmissionError;

/// Successful submission outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Identifier assigned by the receiving side, when it returns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl SubmitReceipt {
    pub fn with_reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, payload: &AnswerSet) -> Result<SubmitReceipt, SubmissionError>;
}
