//! Initialization module for onboard projects.
//!
//! `onboard init` creates the `.onboard/` directory structure:
//!
//! ```text
//! .onboard/
//! ├── onboard.toml     # Configuration (defaults written on first init)
//! ├── drafts/          # One JSON file per in-progress wizard
//! ├── outbox/          # Submissions written by the outbox transport
//! └── flows/           # Project flow definitions (override built-ins)
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// The name of the onboard project directory.
pub const ONBOARD_DIR: &str = ".onboard";

const DEFAULT_CONFIG: &str = r#"# onboard configuration

[drafts]
# Quiet period before an edited answer set is written to disk
debounce_ms = 500
# "clear" removes the draft when a wizard is closed without submitting,
# "keep" leaves it for the next run
teardown = "clear"
# max_age_hours = 72

[navigation]
base_url = "onboard://portal/"
step_param = "step"

[transport]
# "outbox" writes submissions to .onboard/outbox, "http" POSTs them
mode = "outbox"
# endpoint = "https://portal.example.gov/api/onboarding"
timeout_secs = 30
"#;

/// Result of initializing an onboard project.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the .onboard directory
    pub onboard_dir: PathBuf,
    /// Whether the directory was newly created (false if it already existed)
    pub created: bool,
}

/// Initialize an onboard project in the given directory.
///
/// Re-running on an existing project completes any missing pieces and never
/// overwrites existing files.
pub fn init_project(project_dir: &Path) -> Result<InitResult> {
    let onboard_dir = project_dir.join(ONBOARD_DIR);
    let created = !onboard_dir.exists();

    std::fs::create_dir_all(&onboard_dir)
        .with_context(|| format!("Failed to create directory: {}", onboard_dir.display()))?;
    ensure_directory_structure(&onboard_dir)?;

    Ok(InitResult {
        onboard_dir,
        created,
    })
}

/// Ensure all required subdirectories and files exist.
fn ensure_directory_structure(onboard_dir: &Path) -> Result<()> {
    for sub in ["drafts", "outbox", "flows"] {
        let path = onboard_dir.join(sub);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {} directory: {}", sub, path.display()))?;
    }

    let config_file = onboard_dir.join("onboard.toml");
    if !config_file.exists() {
        std::fs::write(&config_file, DEFAULT_CONFIG).with_context(|| {
            format!("Failed to create onboard.toml: {}", config_file.display())
        })?;
    }

    Ok(())
}

/// Default configuration file contents.
pub fn default_config() -> &'static str {
    DEFAULT_CONFIG
}

/// Check if a project is already initialized with onboard.
pub fn is_initialized(project_dir: &Path) -> bool {
    project_dir.join(ONBOARD_DIR).exists()
}

/// Get the path to the onboard directory for a project.
pub fn get_onboard_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(ONBOARD_DIR)
}
