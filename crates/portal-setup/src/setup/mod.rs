//! Database setup flow: connectivity, migrations, then superuser creation.

mod database;
mod orchestrator;
mod report;
pub mod superuser;

pub use database::DatabaseSetup;
pub use orchestrator::run_setup;
pub use superuser::SuperuserInput;

use std::future::Future;
use std::pin::Pin;
use std::process::ExitCode;

use portal_core::account::ProvisionError;
use portal_runtime::{ConnectivityError, MigrationError, MigrationSummary};

/// Boxed future returned by [`SetupSteps`] methods.
pub type StepFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// The three setup steps, run in order by [`run_setup`].
pub trait SetupSteps: Send + Sync {
    /// Run a trivial query against the configured database.
    fn check_connectivity(&self) -> StepFuture<'_, (), ConnectivityError>;

    /// Plan and apply pending migrations.
    fn run_migrations(&self) -> StepFuture<'_, MigrationSummary, MigrationError>;

    /// Create an administrative account, returning its username.
    fn create_superuser(&self) -> StepFuture<'_, String, ProvisionError>;
}

/// Switches for a setup run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupOptions {
    /// Do not attempt superuser creation.
    pub skip_superuser: bool,
    /// Where superuser answers come from.
    pub superuser_input: SuperuserInput,
}

/// How the superuser step ended.
#[derive(Debug)]
pub enum SuperuserOutcome {
    Created(String),
    Skipped,
    Failed(ProvisionError),
}

/// How a setup run ended.
#[derive(Debug)]
pub enum SetupOutcome {
    /// Connectivity and migrations succeeded.
    Completed {
        migrations: MigrationSummary,
        superuser: SuperuserOutcome,
    },
    ConnectivityFailed(ConnectivityError),
    MigrationFailed(MigrationError),
}

impl SetupOutcome {
    /// Whether the required steps succeeded. Superuser failure does not count.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}
