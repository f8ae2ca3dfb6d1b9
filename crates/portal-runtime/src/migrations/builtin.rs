//! Built-in portal schema migrations.
//!
//! These create the account tables superuser provisioning writes to.

use super::runner::Migration;

/// The portal auth schema SQL, embedded from the migrations directory.
const PORTAL_AUTH_SQL: &str = include_str!("../../migrations/0000_portal_auth.sql");

/// Get all built-in migrations.
///
/// These are applied in order before any project migrations.
pub fn get_builtin_migrations() -> Vec<Migration> {
    vec![Migration::new("0000_portal_auth", PORTAL_AUTH_SQL)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_builtin_migrations() {
        let migrations = get_builtin_migrations();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].name, "0000_portal_auth");
    }

    #[test]
    fn test_migration_sql_contains_tables() {
        let migrations = get_builtin_migrations();
        let sql = &migrations[0].sql;

        assert!(sql.contains("CREATE TABLE IF NOT EXISTS portal_users"));
        assert!(sql.contains("is_superuser"));
        assert!(sql.contains("password VARCHAR(128)"));
    }
}
