//! Configuration for onboard, read from `.onboard/onboard.toml`.
//!
//! Settings are layered file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [drafts]
//! debounce_ms = 500
//! teardown = "clear"      # or "keep"
//! max_age_hours = 72
//!
//! [navigation]
//! base_url = "onboard://portal/"
//! step_param = "step"
//!
//! [transport]
//! mode = "outbox"         # or "http"
//! endpoint = "https://portal.example.gov/api/onboarding"
//! timeout_secs = 30
//! ```
//!
//! Environment overrides: `ONBOARD_DEBOUNCE_MS`, `ONBOARD_TEARDOWN`,
//! `ONBOARD_ENDPOINT`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::init::ONBOARD_DIR;
use crate::wizard::{TeardownPolicy, WizardOptions};

/// Where submissions are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Write submissions to `.onboard/outbox/`
    #[default]
    Outbox,
    /// POST submissions to `transport.endpoint`
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Outbox => write!(f, "outbox"),
            TransportMode::Http => write!(f, "http"),
        }
    }
}

/// Draft persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftsSection {
    /// Quiet period before a draft write
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// What unmounting a wizard does to its draft
    #[serde(default)]
    pub teardown: TeardownPolicy,
    /// Drafts older than this are discarded when a wizard mounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_hours: Option<u64>,
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for DraftsSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            teardown: TeardownPolicy::default(),
            max_age_hours: None,
        }
    }
}

/// URL settings for the navigation adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Query parameter that carries the step token
    #[serde(default = "default_step_param")]
    pub step_param: String,
}

fn default_base_url() -> String {
    "onboard://portal/".to_string()
}

fn default_step_param() -> String {
    "step".to_string()
}

impl Default for NavigationSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            step_param: default_step_param(),
        }
    }
}

/// Submission transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSection {
    #[serde(default)]
    pub mode: TransportMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            mode: TransportMode::default(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// The complete onboard.toml structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OnboardToml {
    #[serde(default)]
    pub drafts: DraftsSection,
    #[serde(default)]
    pub navigation: NavigationSection,
    #[serde(default)]
    pub transport: TransportSection,
}

impl OnboardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse onboard.toml")
    }

    /// Load `onboard.toml` from the onboard directory, or defaults if absent.
    pub fn load_or_default(onboard_dir: &Path) -> Result<Self> {
        let config_path = onboard_dir.join("onboard.toml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize onboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Debounce period (env overrides file).
    pub fn debounce(&self) -> Duration {
        let ms = match std::env::var("ONBOARD_DEBOUNCE_MS") {
            Ok(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "ignoring invalid ONBOARD_DEBOUNCE_MS");
                self.drafts.debounce_ms
            }),
            Err(_) => self.drafts.debounce_ms,
        };
        Duration::from_millis(ms)
    }

    /// Teardown policy (env overrides file).
    pub fn teardown(&self) -> TeardownPolicy {
        match std::env::var("ONBOARD_TEARDOWN") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "ignoring invalid ONBOARD_TEARDOWN");
                self.drafts.teardown
            }),
            Err(_) => self.drafts.teardown,
        }
    }

    /// Transport endpoint (env overrides file).
    pub fn endpoint(&self) -> Option<String> {
        std::env::var("ONBOARD_ENDPOINT")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| self.transport.endpoint.clone())
    }

    pub fn max_draft_age(&self) -> Option<chrono::Duration> {
        self.drafts
            .max_age_hours
            .and_then(|h| i64::try_from(h).ok())
            .and_then(chrono::Duration::try_hours)
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.drafts.debounce_ms == 0 {
            warnings.push("drafts.debounce_ms is 0: every change is written immediately".to_string());
        } else if self.drafts.debounce_ms > 10_000 {
            warnings.push(format!(
                "drafts.debounce_ms is {}: edits made in the last {}s before a crash are lost",
                self.drafts.debounce_ms,
                self.drafts.debounce_ms / 1000
            ));
        }

        if self.drafts.max_age_hours == Some(0) {
            warnings.push("drafts.max_age_hours is 0: every saved draft is discarded".to_string());
        }

        if let Err(e) = url::Url::parse(&self.navigation.base_url) {
            warnings.push(format!(
                "Invalid navigation.base_url '{}': {}",
                self.navigation.base_url, e
            ));
        }

        if self.navigation.step_param.trim().is_empty() {
            warnings.push("navigation.step_param is empty".to_string());
        }

        match (&self.transport.mode, &self.transport.endpoint) {
            (TransportMode::Http, None) => {
                warnings.push("transport.mode is 'http' but no transport.endpoint is set".to_string())
            }
            (_, Some(endpoint)) => {
                if let Err(e) = url::Url::parse(endpoint) {
                    warnings.push(format!("Invalid transport.endpoint '{}': {}", endpoint, e));
                }
            }
            _ => {}
        }

        if self.transport.timeout_secs == 0 {
            warnings.push("transport.timeout_secs is 0: HTTP submissions will time out".to_string());
        }

        warnings
    }
}

/// Configuration combining onboard.toml with runtime settings.
///
/// It merges settings from:
/// 1. onboard.toml file
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Debug, Clone)]
pub struct OnboardConfig {
    pub project_dir: PathBuf,
    /// Path to the .onboard directory
    pub onboard_dir: PathBuf,
    pub toml: OnboardToml,
    /// CLI override: verbose mode
    pub verbose: bool,
    /// CLI override: submit over HTTP to this endpoint
    pub cli_endpoint: Option<String>,
}

impl OnboardConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let onboard_dir = project_dir.join(ONBOARD_DIR);
        let toml = OnboardToml::load_or_default(&onboard_dir)?;

        Ok(Self {
            project_dir,
            onboard_dir,
            toml,
            verbose: false,
            cli_endpoint: None,
        })
    }

    pub fn with_cli_args(
        project_dir: PathBuf,
        verbose: bool,
        endpoint: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.cli_endpoint = endpoint;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.onboard_dir.join("onboard.toml")
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.onboard_dir.join("drafts")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.onboard_dir.join("outbox")
    }

    pub fn flows_dir(&self) -> PathBuf {
        self.onboard_dir.join("flows")
    }

    /// Transport mode; an endpoint on the command line implies HTTP.
    pub fn transport_mode(&self) -> TransportMode {
        if self.cli_endpoint.is_some() {
            TransportMode::Http
        } else {
            self.toml.transport.mode
        }
    }

    /// Endpoint (CLI → env → file).
    pub fn endpoint(&self) -> Option<String> {
        self.cli_endpoint.clone().or_else(|| self.toml.endpoint())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.toml.transport.timeout_secs)
    }

    /// Apply draft and navigation settings to a flow's wizard options.
    pub fn apply(&self, options: WizardOptions) -> WizardOptions {
        let mut options = options
            .with_debounce(self.toml.debounce())
            .with_teardown(self.toml.teardown());
        options.step_param = self.toml.navigation.step_param.clone();
        options.max_draft_age = self.toml.max_draft_age();
        options
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
