use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cmd;

#[derive(Parser)]
#[command(name = "onboard")]
#[command(version, about = "Multi-step onboarding wizards for the admin portal")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new onboard project (.onboard/)
    Init,
    /// List available flows
    Flows,
    /// Run a wizard interactively
    Run {
        /// Flow name (see `onboard flows`)
        flow: String,
        /// Start from this URL instead of the flow's route
        #[arg(long)]
        url: Option<String>,
        /// Start at this step (step name or "review")
        #[arg(long)]
        step: Option<String>,
        /// Submit over HTTP to this endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Show the review summary of a saved draft
    Review { flow: String },
    /// List saved drafts
    Drafts,
    /// Delete the saved draft of a flow
    Discard {
        flow: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default onboard.toml file
    Init,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "onboard=debug" } else { "onboard=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Init => cmd::cmd_init(&project_dir)?,
        Commands::Flows => cmd::cmd_flows(&project_dir)?,
        Commands::Run {
            flow,
            url,
            step,
            endpoint,
        } => {
            cmd::cmd_run(
                &project_dir,
                &cli,
                flow,
                url.as_deref(),
                step.as_deref(),
                endpoint.clone(),
            )
            .await?
        }
        Commands::Review { flow } => cmd::cmd_review(&project_dir, flow)?,
        Commands::Drafts => cmd::cmd_drafts(&project_dir)?,
        Commands::Discard { flow, force } => cmd::cmd_discard(&project_dir, flow, *force)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
