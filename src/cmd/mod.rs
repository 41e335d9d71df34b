//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                 |
//! |-----------------|----------------------------------|
//! | `project`       | `Init`                           |
//! | `flows`         | `Flows`                          |
//! | `run`           | `Run`                            |
//! | `drafts`        | `Review`, `Drafts`, `Discard`    |
//! | `config`        | `Config`                         |

pub mod config;
pub mod drafts;
pub mod flows;
pub mod project;
pub mod run;

pub use config::cmd_config;
pub use drafts::{cmd_discard, cmd_drafts, cmd_review};
pub use flows::cmd_flows;
pub use project::cmd_init;
pub use run::cmd_run;

use anyhow::Result;
use std::path::Path;

/// Bail unless `.onboard/` exists.
fn require_initialized(project_dir: &Path) -> Result<()> {
    if !onboard::init::is_initialized(project_dir) {
        anyhow::bail!("No .onboard directory found. Run 'onboard init' first.");
    }
    Ok(())
}
