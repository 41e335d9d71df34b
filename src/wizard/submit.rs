//! Submission coordinator.

use std::sync::Arc;
use tracing::{info, warn};

use super::{Position, Wizard};
use crate::errors::WizardError;
use crate::notify::Notice;
use crate::transport::SubmitReceipt;

impl Wizard {
    /// Submit the answer set from review.
    ///
    /// The transport is called exactly once. On success the draft is removed,
    /// the wizard route is left and a success notice is emitted. On failure
    /// the transport's message is surfaced as-is, the wizard stays on review
    /// and the draft is kept for a retry.
    ///
    /// If the returned future is dropped mid-flight the wizard stays in
    /// `Submitting`.
    pub async fn submit(&mut self) -> Result<SubmitReceipt, WizardError> {
        match self.position {
            Position::Review => {}
            Position::Submitting => return Err(WizardError::SubmissionInFlight),
            Position::Submitted => return Err(WizardError::AlreadySubmitted),
            Position::Step(_) => return Err(WizardError::NotInReview),
        }

        self.position = Position::Submitting;
        self.edit = None;

        let payload = self.registry.payload(&self.answers);
        info!(flow = %self.options.flow, fields = payload.len(), "submitting");

        let transport = Arc::clone(&self.ports.transport);
        match transport.submit(&payload).await {
            Ok(receipt) => {
                self.writer.cancel();
                self.clear_draft();
                self.ports.nav.leave(&self.options.exit_route);

                let message = match self.identity_value() {
                    Some(identity) => format!("{} submitted: {}", self.options.title, identity),
                    None => format!("{} submitted", self.options.title),
                };
                self.ports.notifier.notify(Notice::success(message));
                self.position = Position::Submitted;

                info!(
                    flow = %self.options.flow,
                    reference = receipt.reference.as_deref().unwrap_or("-"),
                    "submission accepted"
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!(flow = %self.options.flow, error = %err, "submission failed");
                self.ports.notifier.notify(Notice::error(err.message.clone()));
                self.position = Position::Review;
                Err(err.into())
            }
        }
    }

    /// Value quoted in the success notice: the configured identity field,
    /// otherwise the first non-blank answer in step order.
    pub fn identity_value(&self) -> Option<String> {
        if let Some(key) = &self.options.identity_field
            && let Some(value) = self.answers.get(key)
            && !value.is_blank()
        {
            return Some(value.display());
        }

        self.registry
            .all_keys()
            .filter_map(|key| self.answers.get(key))
            .find(|value| !value.is_blank())
            .map(|value| value.display())
    }
}
