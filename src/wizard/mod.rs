//! The wizard state machine.
//!
//! A `Wizard` owns one session's answer set and runtime state. It moves
//! between `Position`s, validates only the step being left on forward
//! moves, remembers where an edit-mode jump came from, keeps the step token
//! in the URL in sync, and writes debounced draft snapshots.
//!
//! The draft lifecycle:
//! - mount: hydrate from the stored draft (fail-open)
//! - `set_field`: schedule a debounced write of the full answer set
//! - successful `submit`: remove the draft
//! - `cancel`: remove the draft
//! - teardown / drop: apply the configured `TeardownPolicy`

mod position;
mod submit;

pub use position::Position;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::answers::{AnswerSet, AnswerValue, FieldErrors};
use crate::debounce::Debouncer;
use crate::draft::{Draft, DraftStore};
use crate::errors::WizardError;
use crate::nav::{NavOptions, Navigator};
use crate::notify::Notifier;
use crate::step::{StepDefinition, StepRegistry};
use crate::transport::Transport;
use crate::validation::Validator;

/// Default quiet period before a draft write.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// What happens to the stored draft when a wizard is torn down without
/// submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TeardownPolicy {
    /// Drop any pending write and remove the draft.
    #[default]
    #[serde(rename = "clear")]
    ClearDraft,
    /// Flush any pending write so the draft survives.
    #[serde(rename = "keep")]
    KeepDraft,
}

impl FromStr for TeardownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clear" => Ok(TeardownPolicy::ClearDraft),
            "keep" => Ok(TeardownPolicy::KeepDraft),
            other => Err(format!(
                "Unknown teardown policy '{}' (expected 'clear' or 'keep')",
                other
            )),
        }
    }
}

impl std::fmt::Display for TeardownPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeardownPolicy::ClearDraft => write!(f, "clear"),
            TeardownPolicy::KeepDraft => write!(f, "keep"),
        }
    }
}

/// Per-flow wizard settings.
#[derive(Debug, Clone)]
pub struct WizardOptions {
    /// Flow name recorded in drafts
    pub flow: String,
    /// Human-readable flow title used in notices
    pub title: String,
    pub storage_key: String,
    /// Query parameter holding the step token
    pub step_param: String,
    pub debounce: Duration,
    pub teardown: TeardownPolicy,
    /// Drafts older than this are discarded on mount
    pub max_draft_age: Option<chrono::Duration>,
    /// Answer key quoted in the success notice
    pub identity_field: Option<String>,
    /// Route to leave to after submit or cancel
    pub exit_route: String,
}

impl WizardOptions {
    pub fn new(flow: &str) -> Self {
        Self {
            flow: flow.to_string(),
            title: flow.to_string(),
            storage_key: format!("draft-{}", flow),
            step_param: "step".to_string(),
            debounce: DEFAULT_DEBOUNCE,
            teardown: TeardownPolicy::default(),
            max_draft_age: None,
            identity_field: None,
            exit_route: "/".to_string(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_storage_key(mut self, key: &str) -> Self {
        self.storage_key = key.to_string();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_teardown(mut self, teardown: TeardownPolicy) -> Self {
        self.teardown = teardown;
        self
    }

    pub fn with_max_draft_age(mut self, age: chrono::Duration) -> Self {
        self.max_draft_age = Some(age);
        self
    }

    pub fn with_identity_field(mut self, key: &str) -> Self {
        self.identity_field = Some(key.to_string());
        self
    }

    pub fn with_exit_route(mut self, route: &str) -> Self {
        self.exit_route = route.to_string();
        self
    }
}

/// The external capabilities a wizard consumes.
#[derive(Clone)]
pub struct WizardPorts {
    pub store: Arc<dyn DraftStore>,
    pub validator: Arc<dyn Validator>,
    pub nav: Arc<dyn Navigator>,
    pub transport: Arc<dyn Transport>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, Copy)]
struct EditSession {
    /// Position that was active before the jump
    return_to: Position,
}

pub struct Wizard {
    registry: Arc<StepRegistry>,
    ports: WizardPorts,
    options: WizardOptions,
    position: Position,
    edit: Option<EditSession>,
    answers: AnswerSet,
    errors: FieldErrors,
    touched: BTreeSet<String>,
    writer: Debouncer<Vec<u8>>,
    resumed: bool,
    draft_cleared: bool,
    released: bool,
}

impl Wizard {
    /// Mount a wizard: resolve the initial position from the URL and hydrate
    /// answers from the stored draft. Never fails; a missing, unreadable or
    /// stale draft starts an empty answer set.
    pub fn mount(registry: Arc<StepRegistry>, ports: WizardPorts, options: WizardOptions) -> Self {
        let token = ports.nav.get_param(&options.step_param);
        let position = token
            .as_deref()
            .and_then(|t| registry.position_for_token(t))
            .unwrap_or(Position::Step(1));

        if let Some(canonical) = registry.token_for(position)
            && token.as_deref() != Some(canonical)
        {
            ports
                .nav
                .set_param(&options.step_param, canonical, NavOptions { scroll: false });
        }

        let answers = hydrate(&registry, ports.store.as_ref(), &options);
        let resumed = answers.is_some();

        let store = Arc::clone(&ports.store);
        let key = options.storage_key.clone();
        let writer = Debouncer::new(options.debounce, move |bytes: Vec<u8>| {
            match store.set(&key, &bytes) {
                Ok(()) => debug!(key = %key, bytes = bytes.len(), "draft written"),
                Err(e) => warn!(key = %key, error = %e, "draft write failed"),
            }
        });

        debug!(flow = %options.flow, %position, resumed, "wizard mounted");

        Self {
            registry,
            ports,
            options,
            position,
            edit: None,
            answers: answers.unwrap_or_default(),
            errors: FieldErrors::new(),
            touched: BTreeSet::new(),
            writer,
            resumed,
            draft_cleared: false,
            released: false,
        }
    }

    // =========================================
    // read-only view state
    // =========================================

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn options(&self) -> &WizardOptions {
        &self.options
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Definition of the current step, when on a data-entry step.
    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.position.step_index().and_then(|i| self.registry.get(i))
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit.is_some()
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn answers_snapshot(&self) -> AnswerSet {
        self.answers.clone()
    }

    pub fn validation_errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn touched(&self) -> &BTreeSet<String> {
        &self.touched
    }

    /// Error for a field, only once the field has been touched.
    pub fn visible_error(&self, key: &str) -> Option<&str> {
        if !self.touched.contains(key) {
            return None;
        }
        self.errors.get(key).map(String::as_str)
    }

    /// `(current, total)` where review counts as the last screen.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.registry.len() + 1;
        let current = self.position.ordinal(self.registry.len()).unwrap_or(total);
        (current, total)
    }

    pub fn can_submit(&self) -> bool {
        self.position == Position::Review
    }

    /// Where `back()` would go, if anywhere.
    pub fn back_target(&self) -> Option<Position> {
        if let Some(edit) = self.edit {
            return Some(edit.return_to);
        }
        match self.position {
            Position::Step(i) if i > 1 => Some(Position::Step(i - 1)),
            Position::Review => Some(Position::Step(self.registry.len())),
            _ => None,
        }
    }

    /// Whether the answer set was hydrated from a stored draft.
    pub fn resumed_from_draft(&self) -> bool {
        self.resumed
    }

    pub fn has_pending_write(&self) -> bool {
        self.writer.is_pending()
    }

    // =========================================
    // field events
    // =========================================

    /// Record a value. Never validates and never clears an existing error.
    pub fn set_field(&mut self, key: &str, value: impl Into<AnswerValue>) {
        self.answers.set(key, value);
        if self.position == Position::Submitted {
            return;
        }
        self.schedule_write();
    }

    /// Validate a single field, mark it touched and set or clear its error.
    /// Returns the field's current error.
    pub async fn blur_field(&mut self, key: &str) -> Option<String> {
        if self.registry.owner_of(key).is_none() {
            return None;
        }

        let subset = self.answers.subset([key]);
        let reported = self.ports.validator.validate(&subset).await;
        self.touched.insert(key.to_string());

        match reported.get(key) {
            Some(message) => {
                self.errors.insert(key.to_string(), message.clone());
                Some(message.clone())
            }
            None => {
                self.errors.remove(key);
                None
            }
        }
    }

    // =========================================
    // transitions
    // =========================================

    /// Move to `target`. Forward moves outside edit mode first validate the
    /// fields of the step being left.
    pub async fn advance(&mut self, target: Position, edit_mode: bool) -> Result<(), WizardError> {
        self.ensure_navigable()?;
        self.check_target(target)?;

        let count = self.registry.len();
        let forward = target.ordinal(count) > self.position.ordinal(count);
        if !edit_mode
            && forward
            && let Position::Step(index) = self.position
        {
            self.validate_step(index).await?;
        }

        self.transition(target, edit_mode);
        Ok(())
    }

    /// Jump from review into a step; `back()` then returns to review.
    pub fn edit_step(&mut self, index: usize) -> Result<(), WizardError> {
        match self.position {
            Position::Review => {}
            Position::Submitting => return Err(WizardError::SubmissionInFlight),
            Position::Submitted => return Err(WizardError::AlreadySubmitted),
            Position::Step(_) => return Err(WizardError::NotInReview),
        }
        let target = Position::Step(index);
        self.check_target(target)?;
        self.transition(target, true);
        Ok(())
    }

    /// The back affordance. Never validates.
    pub fn back(&mut self) -> Result<Position, WizardError> {
        self.ensure_navigable()?;

        if let Some(edit) = self.edit.take() {
            self.move_to(edit.return_to);
            return Ok(self.position);
        }

        let target = match self.position {
            Position::Step(1) => {
                return Err(WizardError::NoPreviousStep {
                    step: self.step_name(1),
                });
            }
            Position::Step(i) => Position::Step(i - 1),
            _ => Position::Step(self.registry.len()),
        };
        self.transition(target, false);
        Ok(self.position)
    }

    /// The continue affordance. In edit mode this saves the edit and returns
    /// to where the jump came from.
    pub async fn next(&mut self) -> Result<Position, WizardError> {
        self.ensure_navigable()?;

        if let Some(edit) = self.edit {
            if let Position::Step(index) = self.position {
                self.validate_step(index).await?;
            }
            self.edit = None;
            self.move_to(edit.return_to);
            return Ok(self.position);
        }

        let target = match self.position {
            Position::Step(i) if i < self.registry.len() => Position::Step(i + 1),
            Position::Step(_) => Position::Review,
            _ => {
                return Err(WizardError::InvalidTarget {
                    target: Position::Submitting,
                });
            }
        };
        self.advance(target, false).await?;
        Ok(self.position)
    }

    // =========================================
    // lifecycle
    // =========================================

    /// Explicit cancel: drop the draft and leave the wizard route.
    pub fn cancel(mut self) {
        self.released = true;
        self.writer.cancel();
        self.clear_draft();
        self.ports.nav.leave(&self.options.exit_route);
        debug!(flow = %self.options.flow, "wizard cancelled");
    }

    /// Unmount the wizard, applying the configured teardown policy.
    pub fn teardown(mut self) {
        let policy = self.options.teardown;
        self.release(policy);
    }

    fn release(&mut self, policy: TeardownPolicy) {
        if self.released {
            return;
        }
        self.released = true;

        match policy {
            TeardownPolicy::ClearDraft => {
                self.writer.cancel();
                self.clear_draft();
            }
            TeardownPolicy::KeepDraft => {
                self.writer.flush();
            }
        }
        debug!(flow = %self.options.flow, %policy, "wizard torn down");
    }

    // =========================================
    // internals
    // =========================================

    fn ensure_navigable(&self) -> Result<(), WizardError> {
        match self.position {
            Position::Submitting => Err(WizardError::SubmissionInFlight),
            Position::Submitted => Err(WizardError::AlreadySubmitted),
            _ => Ok(()),
        }
    }

    fn check_target(&self, target: Position) -> Result<(), WizardError> {
        match target {
            Position::Step(index) if self.registry.get(index).is_none() => {
                Err(WizardError::UnknownStep {
                    index,
                    count: self.registry.len(),
                })
            }
            Position::Step(_) | Position::Review => Ok(()),
            Position::Submitting | Position::Submitted => {
                Err(WizardError::InvalidTarget { target })
            }
        }
    }

    /// Validate exactly the fields owned by step `index`.
    async fn validate_step(&mut self, index: usize) -> Result<(), WizardError> {
        let registry = Arc::clone(&self.registry);
        let Some(step) = registry.get(index) else {
            return Ok(());
        };
        let keys: Vec<&str> = step.field_keys().collect();
        if keys.is_empty() {
            return Ok(());
        }

        let subset = self.answers.subset(keys.iter().copied());
        let reported = self.ports.validator.validate(&subset).await;

        let mut failing = FieldErrors::new();
        for key in &keys {
            match reported.get(*key) {
                Some(message) => {
                    self.errors.insert(key.to_string(), message.clone());
                    failing.insert(key.to_string(), message.clone());
                }
                None => {
                    self.errors.remove(*key);
                }
            }
        }

        if failing.is_empty() {
            return Ok(());
        }

        self.touched.extend(keys.iter().map(|k| k.to_string()));
        debug!(step = %step.name, invalid = failing.len(), "step validation failed");
        Err(WizardError::ValidationFailed {
            step: step.name.clone(),
            errors: failing,
        })
    }

    fn transition(&mut self, target: Position, edit_mode: bool) {
        self.edit = if edit_mode {
            let return_to = self.edit.map_or(self.position, |e| e.return_to);
            Some(EditSession { return_to })
        } else {
            None
        };
        self.move_to(target);
    }

    fn move_to(&mut self, target: Position) {
        let from = self.position;
        self.position = target;
        if let Some(token) = self.registry.token_for(target) {
            self.ports
                .nav
                .set_param(&self.options.step_param, token, NavOptions { scroll: true });
        }
        debug!(%from, to = %target, edit = self.edit.is_some(), "wizard moved");
    }

    fn step_name(&self, index: usize) -> String {
        self.registry
            .get(index)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    fn schedule_write(&mut self) {
        let draft = Draft::new(&self.options.flow, self.answers.clone());
        match draft.to_bytes() {
            Ok(bytes) => self.writer.schedule(bytes),
            Err(e) => warn!(error = %e, "failed to serialize draft"),
        }
    }

    /// Remove the stored draft, at most once per wizard.
    fn clear_draft(&mut self) {
        if self.draft_cleared {
            return;
        }
        match self.ports.store.remove(&self.options.storage_key) {
            Ok(()) => {
                self.draft_cleared = true;
                debug!(key = %self.options.storage_key, "draft removed");
            }
            Err(e) => warn!(key = %self.options.storage_key, error = %e, "draft removal failed"),
        }
    }
}

impl Drop for Wizard {
    fn drop(&mut self) {
        let policy = self.options.teardown;
        self.release(policy);
    }
}

/// Load the stored draft for `options`, keeping only registry-owned keys.
fn hydrate(
    registry: &StepRegistry,
    store: &dyn DraftStore,
    options: &WizardOptions,
) -> Option<AnswerSet> {
    let key = options.storage_key.as_str();
    let draft = match Draft::load(store, key) {
        Ok(Some(draft)) => draft,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "ignoring unreadable draft");
            return None;
        }
    };

    if draft.flow != options.flow {
        warn!(key, flow = %draft.flow, "ignoring draft recorded for another flow");
        return None;
    }

    if let Some(max_age) = options.max_draft_age
        && draft.age(chrono::Utc::now()) > max_age
    {
        warn!(key, saved_at = %draft.saved_at, "discarding stale draft");
        if let Err(e) = store.remove(key) {
            warn!(key, error = %e, "stale draft removal failed");
        }
        return None;
    }

    let mut answers = draft.answers;
    answers.retain(|k| registry.owner_of(k).is_some());
    Some(answers)
}
