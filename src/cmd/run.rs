//! Interactive wizard command: `onboard run <flow>`.
//!
//! Drives a mounted `Wizard` from the terminal. The wizard owns every rule
//! (validation gating, draft persistence, edit mode, submission); this module
//! only prompts for values and maps menu choices onto wizard operations.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::path::Path;
use std::sync::Arc;

use onboard::config::{OnboardConfig, TransportMode};
use onboard::draft::FileDraftStore;
use onboard::errors::WizardError;
use onboard::nav::{NavOptions, Navigator, UrlNavigator};
use onboard::review::project;
use onboard::step::{FieldDefinition, FieldKind};
use onboard::transport::{HttpTransport, OutboxTransport, Transport};
use onboard::ui::icons::{DISCARD, DRAFT, RESUME, WARN};
use onboard::ui::render::{print_review, print_step_errors, print_step_header};
use onboard::ui::{ConsoleNotifier, SubmitSpinner};
use onboard::wizard::{Position, TeardownPolicy, Wizard, WizardPorts};

use super::super::Cli;
use super::require_initialized;

/// What the terminal loop should do after a screen.
enum Outcome {
    Stay,
    Exit,
    Cancel,
    Submitted,
}

pub async fn cmd_run(
    project_dir: &Path,
    cli: &Cli,
    name: &str,
    url: Option<&str>,
    step: Option<&str>,
    endpoint: Option<String>,
) -> Result<()> {
    require_initialized(project_dir)?;
    let config = OnboardConfig::with_cli_args(project_dir.to_path_buf(), cli.verbose, endpoint)?;

    for warning in config.validate() {
        println!("{}{}", WARN, style(warning).yellow());
    }

    let flow = onboard::flow::find(Some(&config.flows_dir()), name)?
        .with_context(|| format!("Unknown flow '{}'. Run 'onboard flows' to list flows.", name))?;
    let built = flow
        .build()
        .with_context(|| format!("Flow '{}' is invalid", name))?;

    let nav = Arc::new(match url {
        Some(url) => UrlNavigator::parse(url).with_context(|| format!("Invalid URL: {}", url))?,
        None => UrlNavigator::for_route(&config.toml.navigation.base_url, &flow.route)
            .context("Invalid navigation base_url")?,
    });
    let options = config.apply(flow.wizard_options());
    if let Some(step) = step {
        nav.set_param(&options.step_param, step, NavOptions::default());
    }

    let transport: Arc<dyn Transport> = match config.transport_mode() {
        TransportMode::Outbox => Arc::new(OutboxTransport::new(config.outbox_dir(), &flow.name)),
        TransportMode::Http => {
            let endpoint = config
                .endpoint()
                .context("HTTP transport needs an endpoint (--endpoint or [transport] endpoint)")?;
            Arc::new(HttpTransport::new(&endpoint, config.timeout())?)
        }
    };

    let ports = WizardPorts {
        store: Arc::new(FileDraftStore::new(config.drafts_dir())),
        validator: built.validator.clone(),
        nav: nav.clone(),
        transport,
        notifier: Arc::new(ConsoleNotifier),
    };

    let mut wizard = Wizard::mount(built.registry.clone(), ports, options);
    tracing::debug!(url = %nav.current_url(), "wizard mounted");

    println!();
    println!("{}", style(&flow.title).bold().underlined());
    if !flow.description.is_empty() {
        println!("{}", style(&flow.description).dim());
    }
    if wizard.resumed_from_draft() {
        println!(
            "{}{}",
            RESUME,
            style("Resuming from your saved draft").cyan()
        );
    }

    let theme = ColorfulTheme::default();
    loop {
        let outcome = match wizard.position() {
            Position::Step(_) => step_screen(&mut wizard, &theme).await?,
            Position::Review => review_screen(&mut wizard, &theme).await?,
            Position::Submitted => Outcome::Submitted,
            Position::Submitting => anyhow::bail!("Wizard is stuck in submission"),
        };

        match outcome {
            Outcome::Stay => continue,
            Outcome::Submitted => {
                if let Some(route) = nav.left_route() {
                    println!("{}", style(format!("Returning to {}", route)).dim());
                }
                wizard.teardown();
                return Ok(());
            }
            Outcome::Exit => {
                let policy = wizard.options().teardown;
                wizard.teardown();
                match policy {
                    TeardownPolicy::KeepDraft => println!(
                        "{}Draft kept. Run 'onboard run {}' to continue.",
                        DRAFT, name
                    ),
                    TeardownPolicy::ClearDraft => println!("{}Draft discarded.", DISCARD),
                }
                return Ok(());
            }
            Outcome::Cancel => {
                let confirm = Confirm::with_theme(&theme)
                    .with_prompt("Cancel and discard all answers?")
                    .default(false)
                    .interact()?;
                if confirm {
                    wizard.cancel();
                    println!("{}Wizard cancelled, draft discarded.", DISCARD);
                    return Ok(());
                }
            }
        }
    }
}

/// Prompt for every field of the current step, then offer the step menu.
async fn step_screen(wizard: &mut Wizard, theme: &ColorfulTheme) -> Result<Outcome> {
    let Some(step) = wizard.current_step().cloned() else {
        return Ok(Outcome::Stay);
    };
    let edit_mode = wizard.is_edit_mode();
    print_step_header(&step, wizard.progress(), edit_mode);

    for field in &step.fields {
        let value = prompt_field(wizard, field, theme)?;
        wizard.set_field(&field.key, value);
        if let Some(message) = wizard.blur_field(&field.key).await {
            println!("  {}", style(message).red());
        }
    }

    let (continue_label, back_label) = if edit_mode {
        ("Save and return to review", "Back to review")
    } else {
        ("Continue", "Back")
    };
    let items = [continue_label, back_label, "Exit", "Cancel"];
    let choice = Select::with_theme(theme)
        .with_prompt("Next")
        .items(&items)
        .default(0)
        .interact()?;

    match choice {
        0 => match wizard.next().await {
            Ok(_) => Ok(Outcome::Stay),
            Err(WizardError::ValidationFailed { errors, .. }) => {
                println!();
                println!("{}", style("Please fix the following:").red().bold());
                print_step_errors(&step, &errors);
                Ok(Outcome::Stay)
            }
            Err(e) => Err(e.into()),
        },
        1 => match wizard.back() {
            Ok(_) => Ok(Outcome::Stay),
            Err(WizardError::NoPreviousStep { .. }) => {
                println!("{}", style("This is the first step.").dim());
                Ok(Outcome::Stay)
            }
            Err(e) => Err(e.into()),
        },
        2 => Ok(Outcome::Exit),
        3 => Ok(Outcome::Cancel),
        _ => unreachable!(),
    }
}

/// Read one value from the terminal, pre-filled with the current answer.
fn prompt_field(
    wizard: &Wizard,
    field: &FieldDefinition,
    theme: &ColorfulTheme,
) -> Result<onboard::answers::AnswerValue> {
    let current = wizard.answers().get(&field.key);
    let prompt = if field.rules.required {
        format!("{} *", field.label)
    } else {
        field.label.clone()
    };

    match field.kind {
        FieldKind::Bool => {
            let default = matches!(current, Some(onboard::answers::AnswerValue::Bool(true)));
            let value = Confirm::with_theme(theme)
                .with_prompt(prompt)
                .default(default)
                .interact()?;
            Ok(value.into())
        }
        FieldKind::Select if !field.options.is_empty() => {
            let selected = current
                .and_then(|v| v.as_text())
                .and_then(|v| field.options.iter().position(|o| o == v))
                .unwrap_or(0);
            let index = Select::with_theme(theme)
                .with_prompt(prompt)
                .items(&field.options)
                .default(selected)
                .interact()?;
            Ok(field.options[index].as_str().into())
        }
        _ => {
            let initial = current.map(|v| v.display()).unwrap_or_default();
            let raw: String = Input::with_theme(theme)
                .with_prompt(prompt)
                .with_initial_text(initial)
                .allow_empty(true)
                .interact_text()
                .context("Failed to read user input")?;
            Ok(field.parse_input(&raw))
        }
    }
}

/// Show the read-only summary and the review menu.
async fn review_screen(wizard: &mut Wizard, theme: &ColorfulTheme) -> Result<Outcome> {
    let title = wizard.options().title.clone();
    print_review(&title, &project(wizard.registry(), wizard.answers()));
    println!();

    let items = ["Submit", "Edit a step", "Back", "Exit", "Cancel"];
    let choice = Select::with_theme(theme)
        .with_prompt("Ready to submit?")
        .items(&items)
        .default(0)
        .interact()?;

    match choice {
        0 => {
            let spinner = SubmitSpinner::start(&title);
            match wizard.submit().await {
                Ok(receipt) => {
                    let message = match receipt.reference {
                        Some(reference) => format!("Submission accepted ({})", reference),
                        None => "Submission accepted".to_string(),
                    };
                    spinner.finish_success(&message);
                    Ok(Outcome::Submitted)
                }
                Err(WizardError::Submission(_)) => {
                    spinner.finish_error("Submission failed");
                    println!(
                        "{}",
                        style("Your answers are kept. You can retry or edit them.").dim()
                    );
                    Ok(Outcome::Stay)
                }
                Err(e) => Err(e.into()),
            }
        }
        1 => {
            let names: Vec<String> = wizard
                .registry()
                .steps()
                .iter()
                .map(|s| {
                    if s.title.is_empty() {
                        s.name.clone()
                    } else {
                        s.title.clone()
                    }
                })
                .collect();
            let index = Select::with_theme(theme)
                .with_prompt("Which step?")
                .items(&names)
                .default(0)
                .interact()?;
            wizard.edit_step(index + 1)?;
            Ok(Outcome::Stay)
        }
        2 => {
            wizard.back()?;
            Ok(Outcome::Stay)
        }
        3 => Ok(Outcome::Exit),
        4 => Ok(Outcome::Cancel),
        _ => unreachable!(),
    }
}
