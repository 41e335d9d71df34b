//! Project initialization command.

use anyhow::Result;

pub fn cmd_init(project_dir: &std::path::Path) -> Result<()> {
    use onboard::init::init_project;
    use onboard::ui::icons::SPARKLE;

    let result = init_project(project_dir)?;

    if result.created {
        println!(
            "{}Initialized onboard project at {}",
            SPARKLE,
            result.onboard_dir.display()
        );
        println!();
        println!("Created directory structure:");
        println!("  .onboard/");
        println!("  ├── onboard.toml  # Configuration (see `onboard config`)");
        println!("  ├── drafts/       # In-progress answers");
        println!("  ├── outbox/       # Submitted wizards (outbox transport)");
        println!("  └── flows/        # Project flow definitions");
        println!();
        println!("Next steps:");
        println!("  1. Run `onboard flows` to see the available flows");
        println!("  2. Run `onboard run <flow>` to start a wizard");
    } else {
        println!(
            "Onboard project already initialized at {}",
            result.onboard_dir.display()
        );
        println!("Directory structure verified.");
    }

    Ok(())
}
