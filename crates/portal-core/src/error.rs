use thiserror::Error;

/// Core error type for portal setup operations.
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl From<toml::de::Error> for PortalError {
    fn from(e: toml::de::Error) -> Self {
        PortalError::Config(format!("Failed to parse config: {}", e))
    }
}

/// Result type alias using PortalError.
pub type Result<T> = std::result::Result<T, PortalError>;
