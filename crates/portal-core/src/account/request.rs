use std::fmt;

use crate::config::SuperuserConfig;

use super::error::ProvisionError;

/// Maximum username length, matching the `portal_users.username` column.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum email length, matching the `portal_users.email` column.
pub const MAX_EMAIL_LENGTH: usize = 254;

const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "qwertyuiop",
    "iloveyou",
    "admin123",
    "administrator",
    "letmein1",
    "welcome1",
    "changeme",
    "passw0rd",
    "football",
    "baseball",
    "sunshine",
    "princess",
    "superuser",
];

/// A single reason an account request was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    UsernameEmpty,
    UsernameTooLong,
    UsernameInvalidCharacters,
    EmailInvalid,
    PasswordEmpty,
    PasswordTooShort { min_length: usize },
    PasswordEntirelyNumeric,
    PasswordTooCommon,
    PasswordSimilarToUsername,
}

impl ValidationIssue {
    /// Whether the operator may knowingly bypass this issue.
    pub fn is_bypassable(&self) -> bool {
        matches!(
            self,
            ValidationIssue::PasswordTooShort { .. }
                | ValidationIssue::PasswordEntirelyNumeric
                | ValidationIssue::PasswordTooCommon
                | ValidationIssue::PasswordSimilarToUsername
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::UsernameEmpty => write!(f, "This field cannot be blank."),
            ValidationIssue::UsernameTooLong => write!(
                f,
                "Ensure the username has at most {} characters.",
                MAX_USERNAME_LENGTH
            ),
            ValidationIssue::UsernameInvalidCharacters => write!(
                f,
                "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters."
            ),
            ValidationIssue::EmailInvalid => write!(f, "Enter a valid email address."),
            ValidationIssue::PasswordEmpty => write!(f, "The password cannot be blank."),
            ValidationIssue::PasswordTooShort { min_length } => write!(
                f,
                "This password is too short. It must contain at least {} characters.",
                min_length
            ),
            ValidationIssue::PasswordEntirelyNumeric => {
                write!(f, "This password is entirely numeric.")
            }
            ValidationIssue::PasswordTooCommon => write!(f, "This password is too common."),
            ValidationIssue::PasswordSimilarToUsername => {
                write!(f, "The password is too similar to the username.")
            }
        }
    }
}

/// Password acceptance rules and hashing cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub iterations: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        SuperuserConfig::default().into()
    }
}

impl From<SuperuserConfig> for PasswordPolicy {
    fn from(config: SuperuserConfig) -> Self {
        Self {
            min_length: config.min_password_length,
            iterations: config.password_iterations,
        }
    }
}

impl PasswordPolicy {
    /// Check a candidate password, returning every rule it breaks.
    pub fn check(&self, password: &str, username: &str) -> Vec<ValidationIssue> {
        if password.is_empty() {
            return vec![ValidationIssue::PasswordEmpty];
        }

        let mut issues = Vec::new();

        if password.chars().count() < self.min_length {
            issues.push(ValidationIssue::PasswordTooShort {
                min_length: self.min_length,
            });
        }

        if password.chars().all(|c| c.is_ascii_digit()) {
            issues.push(ValidationIssue::PasswordEntirelyNumeric);
        }

        let lowered = password.to_lowercase();
        if COMMON_PASSWORDS.contains(&lowered.as_str()) {
            issues.push(ValidationIssue::PasswordTooCommon);
        }

        let username = username.to_lowercase();
        if username.chars().count() >= 3 && lowered.contains(&username) {
            issues.push(ValidationIssue::PasswordSimilarToUsername);
        }

        issues
    }
}

/// Check a username against the account column rules.
pub fn validate_username(username: &str) -> Result<(), ValidationIssue> {
    if username.is_empty() {
        return Err(ValidationIssue::UsernameEmpty);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationIssue::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationIssue::UsernameInvalidCharacters);
    }
    Ok(())
}

/// Check an email address. An empty address is accepted.
pub fn validate_email(email: &str) -> Result<(), ValidationIssue> {
    if email.is_empty() {
        return Ok(());
    }
    if email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return Err(ValidationIssue::EmailInvalid);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationIssue::EmailInvalid);
    };

    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty());

    if local.is_empty() || !domain_ok {
        return Err(ValidationIssue::EmailInvalid);
    }
    Ok(())
}

/// Collected answers for a new superuser account.
#[derive(Clone, PartialEq, Eq)]
pub struct SuperuserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SuperuserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperuserRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SuperuserRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Every rule this request breaks, identity fields first.
    pub fn issues(&self, policy: &PasswordPolicy) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if let Err(issue) = validate_username(&self.username) {
            issues.push(issue);
        }
        if let Err(issue) = validate_email(&self.email) {
            issues.push(issue);
        }
        issues.extend(policy.check(&self.password, &self.username));
        issues
    }

    /// Validate strictly: any issue is an error.
    pub fn validate(&self, policy: &PasswordPolicy) -> Result<(), ProvisionError> {
        let issues = self.issues(policy);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ProvisionError::Validation(issues))
        }
    }
}
