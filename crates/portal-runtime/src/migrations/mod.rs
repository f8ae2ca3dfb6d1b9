//! Schema migrations for the portal database.
//!
//! Built-in migrations ship with the runtime and always run first; project
//! migrations are `NNNN_name.sql` files applied in name order. Each migration
//! is recorded in `portal_migrations` with a SHA-256 checksum of its SQL.

mod builtin;
mod error;
mod plan;
mod runner;

pub use builtin::get_builtin_migrations;
pub use error::MigrationError;
pub use plan::{AppliedMigration, MigrationPlan, MigrationSummary};
pub use runner::{load_migrations_from_dir, Migration, MigrationRunner};
