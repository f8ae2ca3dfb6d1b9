use std::fmt;

use thiserror::Error;

/// SQLSTATE for a rejected password.
const INVALID_PASSWORD: &str = "28P01";
/// SQLSTATE for a rejected role or `pg_hba.conf` entry.
const INVALID_AUTHORIZATION: &str = "28000";
/// SQLSTATE for a database that does not exist.
const INVALID_CATALOG_NAME: &str = "3D000";

/// Why the database could not be reached.
#[derive(Error, Debug)]
pub enum ConnectivityError {
    #[error("could not reach the database server at {target}: {message}")]
    Unreachable { target: String, message: String },

    #[error("authentication failed for {target}: {message}")]
    Authentication { target: String, message: String },

    #[error("database at {target} does not exist: {message}")]
    MissingDatabase { target: String, message: String },

    #[error("connectivity check against {target} failed: {message}")]
    Other { target: String, message: String },

    #[error("invalid database configuration: {0}")]
    InvalidConfig(String),
}

/// The checklist entry a connectivity failure most likely points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikelyCause {
    ServerNotRunning,
    BadCredentials,
    MissingDatabase,
}

impl LikelyCause {
    /// All causes, in checklist order.
    pub const ALL: [LikelyCause; 3] = [
        LikelyCause::ServerNotRunning,
        LikelyCause::BadCredentials,
        LikelyCause::MissingDatabase,
    ];
}

impl fmt::Display for LikelyCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikelyCause::ServerNotRunning => write!(f, "PostgreSQL is installed and running"),
            LikelyCause::BadCredentials => {
                write!(f, "Database credentials in the .env file are correct")
            }
            LikelyCause::MissingDatabase => write!(f, "The configured database exists"),
        }
    }
}

impl ConnectivityError {
    /// Classify a driver error raised while talking to `target`.
    pub fn classify(target: &str, err: &sqlx::Error) -> Self {
        let target = target.to_string();
        let message = err.to_string();

        match err {
            sqlx::Error::Database(db) => match classify_code(db.code().as_deref()) {
                Some(LikelyCause::BadCredentials) => Self::Authentication { target, message },
                Some(LikelyCause::MissingDatabase) => Self::MissingDatabase { target, message },
                _ => Self::Other { target, message },
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::Unreachable { target, message },
            sqlx::Error::Configuration(_) => Self::InvalidConfig(message),
            _ => Self::Other { target, message },
        }
    }

    /// The most likely cause, if the error narrows it down.
    pub fn likely_cause(&self) -> Option<LikelyCause> {
        match self {
            Self::Unreachable { .. } => Some(LikelyCause::ServerNotRunning),
            Self::Authentication { .. } => Some(LikelyCause::BadCredentials),
            Self::MissingDatabase { .. } => Some(LikelyCause::MissingDatabase),
            Self::Other { .. } | Self::InvalidConfig(_) => None,
        }
    }
}

fn classify_code(code: Option<&str>) -> Option<LikelyCause> {
    match code? {
        INVALID_PASSWORD | INVALID_AUTHORIZATION => Some(LikelyCause::BadCredentials),
        INVALID_CATALOG_NAME => Some(LikelyCause::MissingDatabase),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_code() {
        assert_eq!(classify_code(Some("28P01")), Some(LikelyCause::BadCredentials));
        assert_eq!(classify_code(Some("28000")), Some(LikelyCause::BadCredentials));
        assert_eq!(classify_code(Some("3D000")), Some(LikelyCause::MissingDatabase));
        assert_eq!(classify_code(Some("42P01")), None);
        assert_eq!(classify_code(None), None);
    }

    #[test]
    fn test_pool_timeout_is_unreachable() {
        let err = ConnectivityError::classify("localhost:5432/portal", &sqlx::Error::PoolTimedOut);
        assert!(matches!(err, ConnectivityError::Unreachable { .. }));
        assert_eq!(err.likely_cause(), Some(LikelyCause::ServerNotRunning));
        assert!(err.to_string().contains("localhost:5432/portal"));
    }

    #[test]
    fn test_io_error_is_unreachable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ConnectivityError::classify("db:5432/portal", &sqlx::Error::Io(io));
        assert_eq!(err.likely_cause(), Some(LikelyCause::ServerNotRunning));
    }

    #[test]
    fn test_other_errors_have_no_likely_cause() {
        let err = ConnectivityError::classify("db:5432/portal", &sqlx::Error::RowNotFound);
        assert!(matches!(err, ConnectivityError::Other { .. }));
        assert_eq!(err.likely_cause(), None);
    }

    #[test]
    fn test_checklist_order() {
        assert_eq!(LikelyCause::ALL[0], LikelyCause::ServerNotRunning);
        assert!(LikelyCause::BadCredentials.to_string().contains(".env"));
    }
}
