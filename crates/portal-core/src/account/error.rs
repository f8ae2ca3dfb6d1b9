use thiserror::Error;

use super::request::ValidationIssue;

/// Why superuser provisioning did not create an account.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("{}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("That username is already taken: {0}")]
    UsernameTaken(String),

    #[error("Superuser creation needs an interactive terminal (use --no-input with PORTAL_SUPERUSER_USERNAME and PORTAL_SUPERUSER_PASSWORD)")]
    NotInteractive,

    #[error("Missing required input: {0} must be set when running with --no-input")]
    MissingInput(&'static str),

    #[error("Superuser creation cancelled")]
    Cancelled,

    #[error("Prompt failed: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
