//! Configuration view and validation commands: `onboard config`.

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use onboard::config::{OnboardConfig, OnboardToml};
    use onboard::init::{default_config, get_onboard_dir};

    let onboard_dir = get_onboard_dir(project_dir);
    let config_path = onboard_dir.join("onboard.toml");

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Onboard Configuration");
            println!("=====================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                OnboardToml::load(&config_path)?
            } else {
                println!("No onboard.toml found at {}", config_path.display());
                println!("Using default configuration.");
                OnboardToml::default()
            };
            println!();

            println!("[drafts]");
            println!("  debounce_ms = {}", toml.drafts.debounce_ms);
            println!("  teardown = \"{}\"", toml.drafts.teardown);
            if let Some(hours) = toml.drafts.max_age_hours {
                println!("  max_age_hours = {}", hours);
            }
            println!();

            println!("[navigation]");
            println!("  base_url = \"{}\"", toml.navigation.base_url);
            println!("  step_param = \"{}\"", toml.navigation.step_param);
            println!();

            println!("[transport]");
            println!("  mode = \"{}\"", toml.transport.mode);
            if let Some(endpoint) = &toml.transport.endpoint {
                println!("  endpoint = \"{}\"", endpoint);
            }
            println!("  timeout_secs = {}", toml.transport.timeout_secs);
            println!();

            if project_dir.exists() {
                println!("Effective values (with env/CLI overrides):");
                let config = OnboardConfig::new(project_dir.to_path_buf())?;
                println!("  debounce = {}ms", config.toml.debounce().as_millis());
                println!("  teardown = \"{}\"", config.toml.teardown());
                println!(
                    "  endpoint = {}",
                    config.endpoint().as_deref().unwrap_or("(none)")
                );
                println!();
            }

            if !config_path.exists() {
                println!("Run 'onboard config init' to create an onboard.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No onboard.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = OnboardToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("onboard.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !onboard_dir.exists() {
                std::fs::create_dir_all(&onboard_dir)?;
            }

            std::fs::write(&config_path, default_config())?;

            println!("Created onboard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [drafts] debounce_ms, teardown, max_age_hours");
            println!("  - [navigation] base_url, step_param");
            println!("  - [transport] mode, endpoint, timeout_secs");
            println!();
        }
    }

    Ok(())
}
