use console::style;
use tracing::debug;

use portal_core::config::ProjectConfig;

use super::report;
use super::{SetupOptions, SetupOutcome, SetupSteps, SuperuserOutcome};

/// Run connectivity, migrations and superuser creation in order.
///
/// Stops after a connectivity or migration failure. A superuser failure is
/// reported and the run still completes.
pub async fn run_setup<S>(steps: &S, project: &ProjectConfig, options: SetupOptions) -> SetupOutcome
where
    S: SetupSteps + ?Sized,
{
    println!();
    println!(
        "  {}  {} database setup",
        style("⚒️").bold(),
        style(&project.name).bold().cyan()
    );
    println!();

    println!("  {} Checking database connection...", style("→").dim());
    if let Err(err) = steps.check_connectivity().await {
        report::print_connectivity_failure(&err);
        return SetupOutcome::ConnectivityFailed(err);
    }
    println!("  {} Database connection successful", style("✓").green());
    println!();

    println!("  {} Running migrations...", style("→").dim());
    let migrations = match steps.run_migrations().await {
        Ok(summary) => summary,
        Err(err) => {
            report::print_migration_failure(&err);
            return SetupOutcome::MigrationFailed(err);
        }
    };
    report::print_migration_summary(&migrations);
    println!();

    let superuser = if options.skip_superuser {
        debug!("Skipping superuser creation");
        println!("  {} Skipping superuser creation", style("ℹ").blue());
        SuperuserOutcome::Skipped
    } else {
        println!(
            "  {} Creating superuser {}",
            style("→").dim(),
            style("(Ctrl+C to skip)").dim()
        );
        match steps.create_superuser().await {
            Ok(username) => {
                println!(
                    "  {} Superuser {} created",
                    style("✓").green(),
                    style(&username).cyan()
                );
                SuperuserOutcome::Created(username)
            }
            Err(err) => {
                report::print_superuser_failure(&err);
                SuperuserOutcome::Failed(err)
            }
        }
    };

    print_next_steps(project);

    SetupOutcome::Completed {
        migrations,
        superuser,
    }
}

fn print_next_steps(project: &ProjectConfig) {
    println!();
    println!("  {} Database setup completed", style("✅").green());
    println!();
    println!("  Next steps:");
    println!(
        "    1. Update the database credentials in {} if needed",
        style(".env").cyan()
    );
    println!(
        "    2. Start the application: {}",
        style(&project.serve_command).cyan()
    );
    println!("    3. Open {}", style(&project.app_url).cyan());
    println!();
}
