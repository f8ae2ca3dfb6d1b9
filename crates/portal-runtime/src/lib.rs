pub mod accounts;
pub mod db;
pub mod migrations;

pub use accounts::PgSuperuserStore;
pub use db::{ConnectivityError, Database, LikelyCause};
pub use migrations::{
    load_migrations_from_dir, Migration, MigrationError, MigrationPlan, MigrationRunner,
    MigrationSummary,
};
