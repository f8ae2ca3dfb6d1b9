use std::path::PathBuf;

use thiserror::Error;

/// Why the migration step stopped.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Failed to read migrations from {}: {}", .path.display(), .source)]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid migration name '{0}': expected a numeric prefix such as 0001_create_students")]
    InvalidName(String),

    #[error("Migration '{0}' is defined more than once")]
    Duplicate(String),

    #[error("Migration '{name}' changed after it was applied (recorded checksum {recorded}, current {current})")]
    ChecksumMismatch {
        name: String,
        recorded: String,
        current: String,
    },

    #[error("Failed to acquire migration lock: {0}")]
    Lock(#[source] sqlx::Error),

    #[error("Failed to read migration history: {0}")]
    Tracking(#[source] sqlx::Error),

    #[error("Failed to apply migration '{name}': {source}")]
    Apply {
        name: String,
        #[source]
        source: sqlx::Error,
    },
}
