use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing::debug;

use portal_core::config::PortalConfig;

use crate::setup::{run_setup, DatabaseSetup, SetupOptions, SetupOutcome, SuperuserInput};

/// Set up the Smart College Portal database: check the connection, run
/// migrations and create a superuser.
#[derive(Parser, Debug)]
#[command(name = "portal-setup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file. The environment is used when it does not exist.
    #[arg(short, long, default_value = "portal.toml")]
    pub config: PathBuf,

    /// Directory of project migrations (overrides the configuration).
    #[arg(short, long)]
    pub migrations_dir: Option<PathBuf>,

    /// Do not create a superuser.
    #[arg(long)]
    pub skip_superuser: bool,

    /// Read superuser details from PORTAL_SUPERUSER_* variables instead of prompting.
    #[arg(long)]
    pub no_input: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Run setup and map the outcome to an exit status.
    pub async fn execute(self) -> ExitCode {
        let dotenv = dotenvy::dotenv();
        init_tracing(self.verbose);
        match dotenv {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) => debug!("No .env loaded: {}", e),
        }

        match self.run().await {
            Ok(outcome) => outcome.exit_code(),
            Err(e) => {
                eprintln!("  {} {:#}", style("✗").red(), e);
                ExitCode::FAILURE
            }
        }
    }

    /// Load configuration and run every setup step.
    pub async fn run(&self) -> Result<SetupOutcome> {
        let mut config = PortalConfig::load(&self.config)
            .with_context(|| format!("Failed to load configuration from {}", self.config.display()))?;
        if let Some(dir) = &self.migrations_dir {
            config.migrations.dir = dir.clone();
        }

        let options = self.options();
        let project = config.project.clone();
        let setup =
            DatabaseSetup::new(config, options).context("Invalid database configuration")?;

        let outcome = run_setup(&setup, &project, options).await;
        setup.close().await;
        Ok(outcome)
    }

    pub fn options(&self) -> SetupOptions {
        SetupOptions {
            skip_superuser: self.skip_superuser,
            superuser_input: if self.no_input {
                SuperuserInput::Environment
            } else {
                SuperuserInput::Interactive
            },
        }
    }
}

fn init_tracing(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()))
        .with_writer(std::io::stderr)
        .init();
}
