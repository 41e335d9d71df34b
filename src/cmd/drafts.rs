//! Draft inspection commands: `onboard review`, `onboard drafts`, `onboard discard`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use super::require_initialized;

/// Storage key for a flow name; unknown names map to the default key.
fn storage_key(flows_dir: &Path, name: &str) -> Result<String> {
    let flow = onboard::flow::find(Some(flows_dir), name)?;
    Ok(flow
        .map(|f| f.storage_key())
        .unwrap_or_else(|| format!("draft-{}", name)))
}

pub fn cmd_review(project_dir: &Path, name: &str) -> Result<()> {
    use onboard::draft::{Draft, FileDraftStore};
    use onboard::flow::find;
    use onboard::init::get_onboard_dir;
    use onboard::review::project;
    use onboard::ui::render::{format_age, print_review};

    require_initialized(project_dir)?;
    let onboard_dir = get_onboard_dir(project_dir);

    let flow = find(Some(&onboard_dir.join("flows")), name)?
        .with_context(|| format!("Unknown flow '{}'. Run 'onboard flows' to list flows.", name))?;
    let built = flow.build()?;

    let store = FileDraftStore::new(onboard_dir.join("drafts"));
    let Some(draft) = Draft::load(&store, &flow.storage_key())
        .with_context(|| format!("Failed to read draft for '{}'", name))?
    else {
        println!("No saved draft for '{}'.", name);
        return Ok(());
    };

    print_review(&flow.title, &project(&built.registry, &draft.answers));
    println!();
    println!(
        "{}",
        style(format!(
            "Saved {}. Run 'onboard run {}' to continue.",
            format_age(draft.age(chrono::Utc::now())),
            name
        ))
        .dim()
    );

    Ok(())
}

pub fn cmd_drafts(project_dir: &Path) -> Result<()> {
    use onboard::draft::{Draft, DraftStore, FileDraftStore};
    use onboard::init::get_onboard_dir;
    use onboard::ui::icons::{DRAFT, WARN};
    use onboard::ui::render::format_age;

    require_initialized(project_dir)?;
    let store = FileDraftStore::new(get_onboard_dir(project_dir).join("drafts"));
    let keys = store.keys().context("Failed to list drafts")?;

    if keys.is_empty() {
        println!("No saved drafts.");
        return Ok(());
    }

    let now = chrono::Utc::now();
    println!();
    println!("Saved drafts:");
    println!();
    for key in keys {
        match Draft::load(&store, &key) {
            Ok(Some(draft)) => println!(
                "  {}{:<24} {:<14} {:>3} answers  {}",
                DRAFT,
                key,
                draft.flow,
                draft.answers.len(),
                style(format_age(draft.age(now))).dim()
            ),
            Ok(None) => {}
            Err(e) => println!("  {}{:<24} {}", WARN, key, style(e).red()),
        }
    }
    println!();

    Ok(())
}

pub fn cmd_discard(project_dir: &Path, name: &str, force: bool) -> Result<()> {
    use dialoguer::Confirm;
    use onboard::draft::{DraftStore, FileDraftStore};
    use onboard::init::get_onboard_dir;
    use onboard::ui::icons::DISCARD;

    require_initialized(project_dir)?;
    let onboard_dir = get_onboard_dir(project_dir);
    let key = storage_key(&onboard_dir.join("flows"), name)?;
    let store = FileDraftStore::new(onboard_dir.join("drafts"));

    if store.get(&key)?.is_none() {
        println!("No saved draft for '{}'.", name);
        return Ok(());
    }

    if !force {
        let confirm = Confirm::new()
            .with_prompt(format!("Discard the saved draft for '{}'?", name))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirm {
            println!("Discard cancelled");
            return Ok(());
        }
    }

    store.remove(&key)?;
    println!("{}Discarded draft for '{}'", DISCARD, name);
    Ok(())
}
