//! Flow listing command: `onboard flows`.

use anyhow::Result;
use console::style;
use std::path::Path;

pub fn cmd_flows(project_dir: &Path) -> Result<()> {
    use onboard::draft::{DraftStore, FileDraftStore};
    use onboard::flow::load_all;
    use onboard::init::{get_onboard_dir, is_initialized};
    use onboard::ui::icons::{DRAFT, WARN};
    use onboard::ui::render::flow_outline;

    let onboard_dir = get_onboard_dir(project_dir);
    let initialized = is_initialized(project_dir);
    let flows_dir = onboard_dir.join("flows");
    let flows = load_all(initialized.then_some(flows_dir.as_path()))?;
    let store = FileDraftStore::new(onboard_dir.join("drafts"));

    println!();
    println!("Available flows:");
    println!();

    for flow in &flows {
        let origin = if flow.is_builtin() {
            style("built-in").dim()
        } else {
            style("project").cyan()
        };

        match flow.build() {
            Ok(built) => {
                let has_draft = initialized
                    && store
                        .get(&flow.storage_key())
                        .map(|d| d.is_some())
                        .unwrap_or(false);
                let draft_marker = if has_draft {
                    format!("  {}draft saved", DRAFT)
                } else {
                    String::new()
                };

                println!(
                    "  {:<14} {} ({} steps, {}){}",
                    style(&flow.name).bold(),
                    flow.title,
                    built.registry.len(),
                    origin,
                    draft_marker
                );
                println!(
                    "  {:<14} {}",
                    "",
                    style(flow_outline(&built.registry)).dim()
                );
            }
            Err(e) => {
                println!(
                    "  {:<14} {}{}",
                    style(&flow.name).bold(),
                    WARN,
                    style(format!("invalid flow: {}", e)).red()
                );
            }
        }
    }
    println!();

    Ok(())
}
