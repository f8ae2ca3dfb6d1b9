//! Administrative account model.
//!
//! Validation rules, password hashing, and the storage seam used by superuser
//! provisioning. The database-backed store lives in `portal-runtime`.

mod error;
mod password;
mod request;

pub use error::ProvisionError;
pub use password::{hash_password, verify_password, ALGORITHM};
pub use request::{
    validate_email, validate_username, PasswordPolicy, SuperuserRequest, ValidationIssue,
    MAX_EMAIL_LENGTH, MAX_USERNAME_LENGTH,
};

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`SuperuserStore`] methods.
pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = std::result::Result<T, ProvisionError>> + Send + 'a>>;

/// A superuser ready to be stored, with its password already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSuperuser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewSuperuser {
    /// Hash the request's password under `policy`.
    pub fn from_request(request: &SuperuserRequest, policy: &PasswordPolicy) -> Self {
        Self {
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash: hash_password(&request.password, policy.iterations),
        }
    }
}

/// Persistence for administrative accounts.
pub trait SuperuserStore: Send + Sync {
    /// Whether an account with this username exists.
    fn username_exists<'a>(&'a self, username: &'a str) -> StoreFuture<'a, bool>;

    /// Insert the account, returning its id.
    ///
    /// Fails with [`ProvisionError::UsernameTaken`] when the username exists.
    fn create_superuser<'a>(&'a self, user: &'a NewSuperuser) -> StoreFuture<'a, i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_superuser_hashes_password() {
        let request = SuperuserRequest::new("admin", "admin@college.edu", "Tr1cky-Lantern");
        let policy = PasswordPolicy {
            min_length: 8,
            iterations: 10,
        };

        let user = NewSuperuser::from_request(&request, &policy);
        assert_eq!(user.username, "admin");
        assert!(user.password_hash.starts_with("pbkdf2_sha256$10$"));
        assert!(verify_password("Tr1cky-Lantern", &user.password_hash));
    }
}
