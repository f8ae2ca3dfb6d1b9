use tracing::debug;

use portal_core::account::{PasswordPolicy, ProvisionError};
use portal_core::config::PortalConfig;
use portal_runtime::{
    load_migrations_from_dir, ConnectivityError, Database, MigrationError, MigrationRunner,
    MigrationSummary, PgSuperuserStore,
};

use super::report;
use super::superuser::{default_username, provision_from_env, provision_interactive};
use super::{SetupOptions, SetupSteps, StepFuture, SuperuserInput};
use crate::prompt::{InterruptGuard, TerminalPrompter};

/// Setup steps run against the configured PostgreSQL database.
pub struct DatabaseSetup {
    config: PortalConfig,
    db: Database,
    store: PgSuperuserStore,
    input: SuperuserInput,
}

impl DatabaseSetup {
    /// Prepare the pool without connecting.
    pub fn new(config: PortalConfig, options: SetupOptions) -> Result<Self, ConnectivityError> {
        let db = Database::connect_lazy(&config.database)?;
        let store = PgSuperuserStore::new(db.pool().clone());
        debug!("Prepared connection pool for {}", db.target());

        Ok(Self {
            config,
            db,
            store,
            input: options.superuser_input,
        })
    }

    /// Close the pool.
    pub async fn close(&self) {
        self.db.close().await;
    }

    async fn migrate(&self) -> Result<MigrationSummary, MigrationError> {
        let project = load_migrations_from_dir(&self.config.migrations.dir)?;
        let runner = MigrationRunner::new(self.db.pool().clone());

        let plan = runner.plan(project.clone()).await?;
        report::print_plan(&plan);
        if plan.is_up_to_date() {
            debug!("Schema is up to date, {} migrations applied", plan.applied_count);
        }

        runner.run(project).await
    }

    async fn provision(&self) -> Result<String, ProvisionError> {
        let policy = PasswordPolicy::from(self.config.superuser.clone());

        match self.input {
            SuperuserInput::Interactive => {
                if !TerminalPrompter::is_available() {
                    return Err(ProvisionError::NotInteractive);
                }
                let mut guard = InterruptGuard::install().map_err(ProvisionError::Prompt)?;
                let default = default_username();
                tokio::select! {
                    result = provision_interactive(&self.store, &TerminalPrompter, &policy, default.as_deref()) => result,
                    _ = guard.interrupted() => Err(ProvisionError::Cancelled),
                }
            }
            SuperuserInput::Environment => {
                provision_from_env(&self.store, &policy, |key| std::env::var(key).ok()).await
            }
        }
    }
}

impl SetupSteps for DatabaseSetup {
    fn check_connectivity(&self) -> StepFuture<'_, (), ConnectivityError> {
        Box::pin(self.db.health_check())
    }

    fn run_migrations(&self) -> StepFuture<'_, MigrationSummary, MigrationError> {
        Box::pin(self.migrate())
    }

    fn create_superuser(&self) -> StepFuture<'_, String, ProvisionError> {
        Box::pin(self.provision())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::testing::TestDatabase;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(url: &str, migrations_dir: &std::path::Path) -> PortalConfig {
        let mut config = PortalConfig::default();
        config.database.url = url.to_string();
        config.database.connect_timeout_secs = 2;
        config.migrations.dir = migrations_dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_unreachable_database_fails_connectivity() {
        let dir = TempDir::new().unwrap();
        let config = config_for("postgres://postgres@127.0.0.1:1/smart_college_portal", dir.path());
        let setup = DatabaseSetup::new(config, SetupOptions::default()).unwrap();

        assert!(setup.check_connectivity().await.is_err());
        setup.close().await;
    }

    #[tokio::test]
    async fn test_steps_against_real_database() {
        let Ok(base) = TestDatabase::from_env().await else {
            return;
        };
        let db = base.isolated("setup_steps").await.unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("0001_create_departments.sql"),
            "CREATE TABLE departments (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL);",
        )
        .unwrap();

        let setup = DatabaseSetup::new(
            config_for(db.url(), dir.path()),
            SetupOptions {
                skip_superuser: false,
                superuser_input: SuperuserInput::Environment,
            },
        )
        .unwrap();

        setup.check_connectivity().await.unwrap();
        let first = setup.run_migrations().await.unwrap();
        assert_eq!(first.applied, vec!["0000_portal_auth", "0001_create_departments"]);

        let second = setup.run_migrations().await.unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.already_applied, 2);

        setup.close().await;
        db.cleanup().await.unwrap();
    }
}
