//! Superuser provisioning.
//!
//! Interactive runs re-prompt until the answers are acceptable, the way a web
//! framework's `createsuperuser` command does. Unattended runs read
//! `PORTAL_SUPERUSER_*` variables and fail on the first problem.

use std::io;

use portal_core::account::{
    validate_email, validate_username, NewSuperuser, PasswordPolicy, ProvisionError,
    SuperuserRequest, SuperuserStore,
};

use crate::prompt::Prompter;

pub const USERNAME_VAR: &str = "PORTAL_SUPERUSER_USERNAME";
pub const EMAIL_VAR: &str = "PORTAL_SUPERUSER_EMAIL";
pub const PASSWORD_VAR: &str = "PORTAL_SUPERUSER_PASSWORD";

/// Where superuser answers come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuperuserInput {
    /// Prompt on the terminal.
    #[default]
    Interactive,
    /// Read `PORTAL_SUPERUSER_*` environment variables.
    Environment,
}

/// Create a superuser from prompted answers, returning its username.
pub async fn provision_interactive<S, P>(
    store: &S,
    prompter: &P,
    policy: &PasswordPolicy,
    default_username: Option<&str>,
) -> Result<String, ProvisionError>
where
    S: SuperuserStore + ?Sized,
    P: Prompter + ?Sized,
{
    let default_username = match default_username {
        Some(name) if !store.username_exists(name).await? => Some(name),
        _ => None,
    };

    let username = loop {
        let username = prompt(prompter.username(default_username))?;
        let username = username.trim().to_string();
        if let Err(issue) = validate_username(&username) {
            prompter.error(&format!("Error: {}", issue));
            continue;
        }
        if store.username_exists(&username).await? {
            prompter.error("Error: That username is already taken.");
            continue;
        }
        break username;
    };

    let email = loop {
        let email = prompt(prompter.email())?;
        match validate_email(&email) {
            Ok(()) => break email,
            Err(issue) => prompter.error(&format!("Error: {}", issue)),
        }
    };

    let password = loop {
        let password = prompt(prompter.password())?;
        let issues = policy.check(&password, &username);
        if issues.is_empty() {
            break password;
        }
        for issue in &issues {
            prompter.error(&issue.to_string());
        }
        if issues.iter().all(|issue| issue.is_bypassable()) && prompt(prompter.confirm_bypass())? {
            break password;
        }
    };

    let request = SuperuserRequest::new(username, email, password);
    store
        .create_superuser(&NewSuperuser::from_request(&request, policy))
        .await?;
    Ok(request.username)
}

/// Create a superuser from `PORTAL_SUPERUSER_*` values, returning its username.
pub async fn provision_from_env<S, F>(
    store: &S,
    policy: &PasswordPolicy,
    lookup: F,
) -> Result<String, ProvisionError>
where
    S: SuperuserStore + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let username = lookup(USERNAME_VAR)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ProvisionError::MissingInput(USERNAME_VAR))?;
    let password = lookup(PASSWORD_VAR)
        .filter(|v| !v.is_empty())
        .ok_or(ProvisionError::MissingInput(PASSWORD_VAR))?;
    let email = lookup(EMAIL_VAR)
        .map(|v| v.trim().to_string())
        .unwrap_or_default();

    let request = SuperuserRequest::new(username, email, password);
    request.validate(policy)?;

    if store.username_exists(&request.username).await? {
        return Err(ProvisionError::UsernameTaken(request.username));
    }

    store
        .create_superuser(&NewSuperuser::from_request(&request, policy))
        .await?;
    Ok(request.username)
}

/// The login name of the operator, when it is a valid username.
pub fn default_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| validate_username(name).is_ok())
}

fn prompt<T>(answer: io::Result<T>) -> Result<T, ProvisionError> {
    answer.map_err(|e| match e.kind() {
        io::ErrorKind::Interrupted => ProvisionError::Cancelled,
        _ => ProvisionError::Prompt(e),
    })
}
