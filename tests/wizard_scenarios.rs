//! End-to-end wizard scenarios against the built-in organization flow.
//!
//! These drive the public library API the way a view layer would: mount,
//! field events, transitions, review and submission, with in-memory or
//! temp-dir backed capabilities.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use onboard::answers::{AnswerSet, FieldErrors};
use onboard::draft::{Draft, DraftStore, FileDraftStore, MemoryDraftStore};
use onboard::errors::{PersistenceError, SubmissionError, WizardError};
use onboard::flow::{BuiltFlow, FlowFile};
use onboard::nav::{Navigator, UrlNavigator};
use onboard::notify::{NoticeLevel, NoticeLog};
use onboard::review::{PLACEHOLDER, project};
use onboard::transport::{HttpTransport, OutboxTransport, SubmitReceipt, Transport};
use onboard::validation::{RuleValidator, Validator};
use onboard::wizard::{Position, TeardownPolicy, Wizard, WizardOptions, WizardPorts};

const BASE_URL: &str = "onboard://portal/organizations/new";
const DRAFT_KEY: &str = "draft-organization";

// =============================================================================
// Test doubles
// =============================================================================

/// Rule validator that counts how often it is asked.
struct CountingValidator {
    inner: Arc<RuleValidator>,
    calls: AtomicUsize,
}

#[async_trait]
impl Validator for CountingValidator {
    async fn validate(&self, subset: &AnswerSet) -> FieldErrors {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.check(subset)
    }
}

/// Transport that replays scripted outcomes and records payloads.
#[derive(Default)]
struct ScriptedTransport {
    outcomes: Mutex<Vec<Result<SubmitReceipt, SubmissionError>>>,
    payloads: Mutex<Vec<AnswerSet>>,
}

impl ScriptedTransport {
    fn with(outcomes: Vec<Result<SubmitReceipt, SubmissionError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn submit(&self, payload: &AnswerSet) -> Result<SubmitReceipt, SubmissionError> {
        self.payloads.lock().unwrap().push(payload.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(SubmitReceipt::default()))
    }
}

struct Session {
    flow: FlowFile,
    built: BuiltFlow,
    store: Arc<MemoryDraftStore>,
    nav: Arc<UrlNavigator>,
    validator: Arc<CountingValidator>,
    transport: Arc<ScriptedTransport>,
    notices: Arc<NoticeLog>,
}

impl Session {
    fn new(url: &str, transport: ScriptedTransport) -> Self {
        let flow = onboard::flow::find(None, "organization").unwrap().unwrap();
        let built = flow.build().unwrap();
        let validator = Arc::new(CountingValidator {
            inner: built.validator.clone(),
            calls: AtomicUsize::new(0),
        });
        Self {
            flow,
            built,
            store: Arc::new(MemoryDraftStore::new()),
            nav: Arc::new(UrlNavigator::parse(url).unwrap()),
            validator,
            transport: Arc::new(transport),
            notices: Arc::new(NoticeLog::new()),
        }
    }

    fn options(&self) -> WizardOptions {
        self.flow.wizard_options()
    }

    fn mount(&self, options: WizardOptions) -> Wizard {
        let ports = WizardPorts {
            store: self.store.clone(),
            validator: self.validator.clone(),
            nav: self.nav.clone(),
            transport: self.transport.clone(),
            notifier: self.notices.clone(),
        };
        Wizard::mount(self.built.registry.clone(), ports, options)
    }

    fn validations(&self) -> usize {
        self.validator.calls.load(Ordering::SeqCst)
    }
}

fn fill_details(w: &mut Wizard) {
    w.set_field("org_name", "Acme Agency");
    w.set_field("org_code", "ACME");
    w.set_field("org_type", "agency");
}

fn fill_contact(w: &mut Wizard) {
    w.set_field("contact_name", "Ada Admin");
    w.set_field("contact_email", "ada@acme.gov");
}

fn fill_address(w: &mut Wizard) {
    w.set_field("street", "1 Main St");
    w.set_field("city", "Springfield");
    w.set_field("postal_code", "12345");
}

async fn reach_review(w: &mut Wizard) {
    fill_details(w);
    w.next().await.unwrap();
    fill_contact(w);
    w.next().await.unwrap();
    fill_address(w);
    assert_eq!(w.next().await.unwrap(), Position::Review);
}

// =============================================================================
// Validation gating
// =============================================================================

#[tokio::test]
async fn test_forward_blocked_on_invalid_step_reports_only_that_step() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let mut w = s.mount(s.options());

    fill_details(&mut w);
    w.advance(Position::Step(2), false).await.unwrap();
    assert_eq!(w.position(), Position::Step(2));

    w.set_field("contact_name", "Ada Admin");
    let err = w.advance(Position::Step(3), false).await.unwrap_err();

    assert!(matches!(err, WizardError::ValidationFailed { ref step, .. } if step == "contact"));
    assert_eq!(w.position(), Position::Step(2));
    let keys: Vec<&str> = w.validation_errors().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["contact_email"]);
    assert!(w.touched().contains("contact_phone"));
    assert!(w.visible_error("contact_email").is_some());
}

#[tokio::test]
async fn test_errors_for_unreached_steps_never_surface() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let mut w = s.mount(s.options());

    w.set_field("postal_code", "not-a-zip");
    let err = w.next().await.unwrap_err();

    let errors = err.field_errors().unwrap();
    assert!(errors.contains_key("org_name"));
    assert!(!errors.contains_key("postal_code"));
    assert!(w.validation_errors().get("postal_code").is_none());
}

#[tokio::test]
async fn test_fixing_a_field_clears_only_its_error() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let mut w = s.mount(s.options());

    w.set_field("org_code", "acme");
    w.next().await.unwrap_err();
    assert!(w.validation_errors().contains_key("org_code"));
    assert!(w.validation_errors().contains_key("org_name"));

    w.set_field("org_code", "ACME");
    // Typing alone never clears an error
    assert!(w.validation_errors().contains_key("org_code"));

    assert_eq!(w.blur_field("org_code").await, None);
    assert!(!w.validation_errors().contains_key("org_code"));
    assert!(w.validation_errors().contains_key("org_name"));
}

#[tokio::test]
async fn test_backward_moves_never_call_validator() {
    let s = Session::new(&format!("{}?step=address", BASE_URL), ScriptedTransport::default());
    let mut w = s.mount(s.options());
    assert_eq!(w.position(), Position::Step(3));

    w.advance(Position::Step(1), false).await.unwrap();
    assert_eq!(w.back().unwrap_err().to_string(), "There is no step before 'details'");
    w.advance(Position::Step(1), false).await.unwrap();

    assert_eq!(s.validations(), 0);
    assert_eq!(w.position(), Position::Step(1));
}

// =============================================================================
// Review and edit mode
// =============================================================================

#[tokio::test]
async fn test_edit_from_review_returns_to_review_for_every_step() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let mut w = s.mount(s.options());
    reach_review(&mut w).await;

    for k in 1..=w.registry().len() {
        w.edit_step(k).unwrap();
        assert!(w.is_edit_mode());
        assert_eq!(w.back_target(), Some(Position::Review));
        assert_eq!(w.back().unwrap(), Position::Review);
        assert!(!w.is_edit_mode());
    }
}

#[tokio::test]
async fn test_edit_step_two_then_back_shows_mutation_in_review() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let mut w = s.mount(s.options());
    reach_review(&mut w).await;

    w.edit_step(2).unwrap();
    assert!(s.nav.current_url().ends_with("step=contact"));
    w.set_field("contact_name", "Grace Admin");
    assert_eq!(w.back().unwrap(), Position::Review);
    assert!(s.nav.current_url().ends_with("step=review"));

    let sections = project(w.registry(), w.answers());
    let contact = &sections[1];
    assert_eq!(contact.name, "contact");
    let name = contact
        .entries
        .iter()
        .find(|e| e.key == "contact_name")
        .unwrap();
    assert_eq!(name.display, "Grace Admin");
    let phone = contact
        .entries
        .iter()
        .find(|e| e.key == "contact_phone")
        .unwrap();
    assert_eq!(phone.display, PLACEHOLDER);
}

#[tokio::test]
async fn test_save_edit_with_invalid_value_stays_in_step() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let mut w = s.mount(s.options());
    reach_review(&mut w).await;

    w.edit_step(3).unwrap();
    w.set_field("postal_code", "ABC");
    let err = w.next().await.unwrap_err();
    assert!(matches!(err, WizardError::ValidationFailed { .. }));
    assert_eq!(w.position(), Position::Step(3));
    assert!(w.is_edit_mode());

    w.set_field("postal_code", "12345-6789");
    assert_eq!(w.next().await.unwrap(), Position::Review);
}

// =============================================================================
// Draft persistence
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_of_set_field_writes_once_with_last_value() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let mut w = s.mount(s.options());

    for name in ["A", "Ac", "Acm", "Acme", "Acme Agency"] {
        w.set_field("org_name", name);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(s.store.writes(), 0);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(s.store.writes(), 1);

    let draft = Draft::load(s.store.as_ref(), DRAFT_KEY).unwrap().unwrap();
    assert_eq!(draft.flow, "organization");
    assert_eq!(
        draft.answers.get("org_name").unwrap().as_text(),
        Some("Acme Agency")
    );
}

#[tokio::test(start_paused = true)]
async fn test_keep_policy_resumes_in_a_new_wizard_at_url_step() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileDraftStore::new(dir.path().join("drafts")));
    let s = Session::new(BASE_URL, ScriptedTransport::default());

    let ports = |nav: Arc<UrlNavigator>| WizardPorts {
        store: store.clone(),
        validator: s.validator.clone(),
        nav,
        transport: s.transport.clone(),
        notifier: s.notices.clone(),
    };
    let options = s.options().with_teardown(TeardownPolicy::KeepDraft);

    let mut first = Wizard::mount(s.built.registry.clone(), ports(s.nav.clone()), options.clone());
    fill_details(&mut first);
    assert!(first.has_pending_write());
    first.teardown();
    assert!(store.path_for(DRAFT_KEY).exists());

    let nav = Arc::new(UrlNavigator::parse(&format!("{}?step=contact", BASE_URL)).unwrap());
    let second = Wizard::mount(s.built.registry.clone(), ports(nav), options);

    assert!(second.resumed_from_draft());
    assert_eq!(second.position(), Position::Step(2));
    assert_eq!(
        second.answers().get("org_code").unwrap().as_text(),
        Some("ACME")
    );
}

#[tokio::test(start_paused = true)]
async fn test_default_policy_clears_draft_on_teardown() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    s.store.seed(
        DRAFT_KEY,
        Draft::new("organization", [("org_name", "Old")].into_iter().collect())
            .to_bytes()
            .unwrap(),
    );

    let mut w = s.mount(s.options());
    assert!(w.resumed_from_draft());
    w.set_field("org_name", "New");
    w.teardown();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!s.store.contains(DRAFT_KEY));
    assert_eq!(s.store.writes(), 0);
    assert_eq!(s.store.removals(), 1);
}

#[tokio::test]
async fn test_unreadable_draft_store_degrades_to_empty_wizard() {
    let dir = TempDir::new().unwrap();
    let store = FileDraftStore::new(dir.path());
    std::fs::write(store.path_for(DRAFT_KEY), "{\"version\": 1, \"flow\": ").unwrap();

    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let ports = WizardPorts {
        store: Arc::new(store.clone()),
        validator: s.validator.clone(),
        nav: s.nav.clone(),
        transport: s.transport.clone(),
        notifier: s.notices.clone(),
    };
    let w = Wizard::mount(s.built.registry.clone(), ports, s.options());

    assert!(!w.resumed_from_draft());
    assert!(w.answers().is_empty());
    assert_eq!(w.position(), Position::Step(1));
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_successful_submit_clears_draft_once_and_leaves() {
    let s = Session::new(
        BASE_URL,
        ScriptedTransport::with(vec![Ok(SubmitReceipt::with_reference("org-42"))]),
    );
    let mut w = s.mount(s.options());
    reach_review(&mut w).await;
    assert!(w.can_submit());

    let receipt = w.submit().await.unwrap();

    assert_eq!(receipt.reference.as_deref(), Some("org-42"));
    assert_eq!(w.position(), Position::Submitted);
    assert!(!w.can_submit());
    assert_eq!(s.transport.calls(), 1);
    assert_eq!(s.store.removals(), 1);
    assert_eq!(s.nav.left_route().as_deref(), Some("/organizations"));

    let notice = s.notices.last().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Organization submitted: Acme Agency");

    drop(w);
    assert_eq!(s.store.removals(), 1);
}

#[tokio::test]
async fn test_rejected_submit_surfaces_message_and_keeps_draft() {
    let s = Session::new(
        BASE_URL,
        ScriptedTransport::with(vec![Err(SubmissionError::new("conflict"))]),
    );
    let mut w = s.mount(s.options());
    reach_review(&mut w).await;

    let err = w.submit().await.unwrap_err();

    assert!(matches!(err, WizardError::Submission(ref e) if e.message == "conflict"));
    assert_eq!(w.position(), Position::Review);
    assert!(w.can_submit());
    assert_eq!(s.store.removals(), 0);
    assert_eq!(s.nav.left_route(), None);

    let notice = s.notices.last().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "conflict");

    // Retry without re-entering anything
    w.submit().await.unwrap();
    assert_eq!(s.transport.calls(), 2);
    assert_eq!(w.position(), Position::Submitted);
}

#[tokio::test]
async fn test_submit_payload_holds_only_flow_fields() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let mut w = s.mount(s.options());
    w.set_field("debug_note", "not part of the flow");
    reach_review(&mut w).await;

    w.submit().await.unwrap();

    let payloads = s.transport.payloads.lock().unwrap();
    let payload = &payloads[0];
    assert!(!payload.contains("debug_note"));
    assert_eq!(payload.get("city").unwrap().as_text(), Some("Springfield"));
}

#[tokio::test]
async fn test_outbox_transport_records_submission() {
    let dir = TempDir::new().unwrap();
    let outbox = dir.path().join("outbox");
    let s = Session::new(BASE_URL, ScriptedTransport::default());

    let ports = WizardPorts {
        store: s.store.clone(),
        validator: s.validator.clone(),
        nav: s.nav.clone(),
        transport: Arc::new(OutboxTransport::new(&outbox, "organization")),
        notifier: s.notices.clone(),
    };
    let mut w = Wizard::mount(s.built.registry.clone(), ports, s.options());
    reach_review(&mut w).await;

    let receipt = w.submit().await.unwrap();

    let files: Vec<_> = std::fs::read_dir(&outbox)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("organization-"));
    assert!(name.contains(receipt.reference.as_deref().unwrap()));

    let content = std::fs::read_to_string(&files[0]).unwrap();
    assert!(content.contains("Acme Agency"));
}

#[tokio::test]
async fn test_cancel_discards_draft_and_leaves_route() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    s.store.seed(
        DRAFT_KEY,
        Draft::new("organization", AnswerSet::new()).to_bytes().unwrap(),
    );
    let mut w = s.mount(s.options());
    fill_details(&mut w);

    w.cancel();

    assert!(!s.store.contains(DRAFT_KEY));
    assert_eq!(s.nav.left_route().as_deref(), Some("/organizations"));
    assert_eq!(s.transport.calls(), 0);
}

#[test]
fn test_navigator_contract_is_object_safe() {
    let nav: Arc<dyn Navigator> = Arc::new(UrlNavigator::parse(BASE_URL).unwrap());
    let store: Arc<dyn DraftStore> = Arc::new(MemoryDraftStore::new());
    assert_eq!(nav.get_param("step"), None);
    assert_eq!(store.get(DRAFT_KEY).unwrap(), None);
}

// =============================================================================
// Slow draft store
// =============================================================================

/// Draft store whose writes take a while, recording the order of events.
#[derive(Default)]
struct SlowStore {
    inner: MemoryDraftStore,
    events: Mutex<Vec<&'static str>>,
}

impl SlowStore {
    fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

impl DraftStore for SlowStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.events.lock().unwrap().push("set start");
        std::thread::sleep(Duration::from_millis(100));
        let result = self.inner.set(key, bytes);
        self.events.lock().unwrap().push("set end");
        result
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.events.lock().unwrap().push("remove");
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        self.inner.keys()
    }
}

fn mount_with_store(s: &Session, store: Arc<SlowStore>, options: WizardOptions) -> Wizard {
    let ports = WizardPorts {
        store,
        validator: s.validator.clone(),
        nav: s.nav.clone(),
        transport: s.transport.clone(),
        notifier: s.notices.clone(),
    };
    Wizard::mount(s.built.registry.clone(), ports, options)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_teardown_during_draft_write_leaves_no_draft() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let store = Arc::new(SlowStore::default());
    let options = s.options().with_debounce(Duration::from_millis(10));
    let mut w = mount_with_store(&s, store.clone(), options);

    w.set_field("org_name", "Acme Agency");
    tokio::time::sleep(Duration::from_millis(40)).await;
    w.teardown();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.events(), vec!["set start", "set end", "remove"]);
    assert!(!store.inner.contains(DRAFT_KEY));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_during_draft_write_leaves_no_draft() {
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let store = Arc::new(SlowStore::default());
    let options = s.options().with_debounce(Duration::from_millis(10));
    let mut w = mount_with_store(&s, store.clone(), options);

    fill_details(&mut w);
    w.next().await.unwrap();
    fill_contact(&mut w);
    w.next().await.unwrap();
    fill_address(&mut w);
    w.next().await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;

    w.submit().await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.events().last(), Some(&"remove"));
    assert!(!store.inner.contains(DRAFT_KEY));
}

// =============================================================================
// HTTP submission
// =============================================================================

/// Answer one request with a canned JSON response.
async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let len = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });
    format!("http://{}/api/onboarding", addr)
}

#[tokio::test]
async fn test_http_conflict_reaches_user_verbatim_and_keeps_draft() {
    let url = serve_once("409 Conflict", r#"{"message":"conflict"}"#).await;
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let ports = WizardPorts {
        store: s.store.clone(),
        validator: s.validator.clone(),
        nav: s.nav.clone(),
        transport: Arc::new(HttpTransport::new(&url, Duration::from_secs(5)).unwrap()),
        notifier: s.notices.clone(),
    };
    let mut w = Wizard::mount(s.built.registry.clone(), ports, s.options());
    reach_review(&mut w).await;

    let err = w.submit().await.unwrap_err();

    assert!(matches!(err, WizardError::Submission(ref e) if e.message == "conflict"));
    assert_eq!(w.position(), Position::Review);
    assert_eq!(s.notices.last().unwrap().message, "conflict");
    assert_eq!(s.store.removals(), 0);
}

#[tokio::test]
async fn test_http_success_submits_and_clears_draft() {
    let url = serve_once("201 Created", r#"{"id":"org-9"}"#).await;
    let s = Session::new(BASE_URL, ScriptedTransport::default());
    let ports = WizardPorts {
        store: s.store.clone(),
        validator: s.validator.clone(),
        nav: s.nav.clone(),
        transport: Arc::new(HttpTransport::new(&url, Duration::from_secs(5)).unwrap()),
        notifier: s.notices.clone(),
    };
    let mut w = Wizard::mount(s.built.registry.clone(), ports, s.options());
    reach_review(&mut w).await;

    let receipt = w.submit().await.unwrap();

    assert_eq!(receipt.reference.as_deref(), Some("org-9"));
    assert_eq!(w.position(), Position::Submitted);
    assert_eq!(s.store.removals(), 1);
}
