use console::style;

use portal_core::account::ProvisionError;
use portal_runtime::{ConnectivityError, LikelyCause, MigrationError, MigrationPlan, MigrationSummary};

/// Checklist lines for a connectivity failure, with the likely cause marked.
pub(crate) fn connectivity_checklist(err: &ConnectivityError) -> Vec<(bool, String)> {
    let likely = err.likely_cause();
    LikelyCause::ALL
        .iter()
        .map(|cause| (Some(*cause) == likely, cause.to_string()))
        .collect()
}

pub(crate) fn print_connectivity_failure(err: &ConnectivityError) {
    println!("  {} Database connection failed", style("✗").red());
    println!("    {}", style(err).dim());
    println!();
    println!("  Please check:");
    for (likely, item) in connectivity_checklist(err) {
        if likely {
            println!("    {} {} {}", style("→").yellow(), style(item).yellow(), style("(likely)").dim());
        } else {
            println!("    {} {}", style("-").dim(), item);
        }
    }
    println!();
}

pub(crate) fn print_plan(plan: &MigrationPlan) {
    if plan.is_up_to_date() {
        println!("  {} No pending migrations", style("ℹ").blue());
        return;
    }
    println!("  {} Pending:", style("○").yellow());
    for name in plan.pending_names() {
        println!("    {} {}", style("→").dim(), style(name).yellow());
    }
}

pub(crate) fn print_migration_summary(summary: &MigrationSummary) {
    for name in &summary.applied {
        println!("    {} {}", style("↓").green(), style(name).cyan());
    }
    for name in &summary.unknown {
        println!(
            "    {} {} {}",
            style("?").yellow(),
            style(name).yellow(),
            style("(recorded but not found on disk)").dim()
        );
    }
    println!(
        "  {} Migrations complete ({} applied, {} already up to date)",
        style("✓").green(),
        summary.applied.len(),
        summary.already_applied
    );
}

pub(crate) fn print_migration_failure(err: &MigrationError) {
    println!("  {} Migration failed", style("✗").red());
    println!("    {}", style(err).dim());
    println!();
}

pub(crate) fn print_superuser_failure(err: &ProvisionError) {
    println!("  {} Superuser was not created: {}", style("⚠").yellow(), err);
    println!(
        "    {} Create one later with {}",
        style("→").dim(),
        style("portal-setup --no-input").cyan()
    );
}
