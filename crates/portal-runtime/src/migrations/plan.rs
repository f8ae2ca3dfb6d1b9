use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::error::MigrationError;
use super::runner::Migration;

/// A migration recorded in `portal_migrations`.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    pub name: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
    pub execution_time_ms: i32,
}

/// What a migration run would do, computed before touching the schema.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    /// Migrations to apply, in order.
    pub pending: Vec<Migration>,
    /// Number of known migrations already applied.
    pub applied_count: usize,
    /// Applied names that no longer exist in the migration set.
    pub unknown: Vec<String>,
}

impl MigrationPlan {
    /// Compare the available migrations with the recorded history.
    ///
    /// Rejects duplicate names and applied migrations whose SQL changed.
    pub fn build(
        available: Vec<Migration>,
        applied: &[AppliedMigration],
    ) -> Result<Self, MigrationError> {
        let mut seen = HashSet::new();
        for migration in &available {
            if !seen.insert(migration.name.as_str()) {
                return Err(MigrationError::Duplicate(migration.name.clone()));
            }
        }

        let recorded: HashMap<&str, &AppliedMigration> =
            applied.iter().map(|m| (m.name.as_str(), m)).collect();

        let mut pending = Vec::new();
        let mut applied_count = 0;

        for migration in available.iter() {
            match recorded.get(migration.name.as_str()) {
                Some(record) => {
                    let current = migration.checksum();
                    if record.checksum != current {
                        return Err(MigrationError::ChecksumMismatch {
                            name: migration.name.clone(),
                            recorded: record.checksum.clone(),
                            current,
                        });
                    }
                    applied_count += 1;
                }
                None => pending.push(migration.clone()),
            }
        }

        let mut unknown: Vec<String> = applied
            .iter()
            .filter(|m| !seen.contains(m.name.as_str()))
            .map(|m| m.name.clone())
            .collect();
        unknown.sort();

        Ok(Self {
            pending,
            applied_count,
            unknown,
        })
    }

    /// Whether nothing is left to apply.
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    /// Names of the pending migrations, in order.
    pub fn pending_names(&self) -> Vec<String> {
        self.pending.iter().map(|m| m.name.clone()).collect()
    }
}

/// Result of a completed migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Migrations applied by this run, in order.
    pub applied: Vec<String>,
    /// Migrations that were already applied beforehand.
    pub already_applied: usize,
    /// Recorded migrations missing from the migration set.
    pub unknown: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(migration: &Migration) -> AppliedMigration {
        AppliedMigration {
            name: migration.name.clone(),
            checksum: migration.checksum(),
            applied_at: Utc::now(),
            execution_time_ms: 3,
        }
    }

    fn set() -> Vec<Migration> {
        vec![
            Migration::new("0000_portal_auth", "CREATE TABLE portal_users (id BIGINT);"),
            Migration::new("0001_departments", "CREATE TABLE departments (id BIGINT);"),
            Migration::new("0002_students", "CREATE TABLE students (id BIGINT);"),
        ]
    }

    #[test]
    fn test_fresh_database_has_everything_pending() {
        let plan = MigrationPlan::build(set(), &[]).unwrap();
        assert_eq!(
            plan.pending_names(),
            vec!["0000_portal_auth", "0001_departments", "0002_students"]
        );
        assert_eq!(plan.applied_count, 0);
        assert!(!plan.is_up_to_date());
    }

    #[test]
    fn test_partially_applied() {
        let migrations = set();
        let history = vec![applied(&migrations[0])];

        let plan = MigrationPlan::build(migrations, &history).unwrap();
        assert_eq!(plan.pending_names(), vec!["0001_departments", "0002_students"]);
        assert_eq!(plan.applied_count, 1);
    }

    #[test]
    fn test_fully_applied_is_up_to_date() {
        let migrations = set();
        let history: Vec<_> = migrations.iter().map(applied).collect();

        let plan = MigrationPlan::build(migrations, &history).unwrap();
        assert!(plan.is_up_to_date());
        assert_eq!(plan.applied_count, 3);
        assert!(plan.unknown.is_empty());
    }

    #[test]
    fn test_modified_migration_is_rejected() {
        let migrations = set();
        let mut history: Vec<_> = migrations.iter().map(applied).collect();
        history[1].checksum = "0".repeat(64);

        let err = MigrationPlan::build(migrations, &history).unwrap_err();
        match err {
            MigrationError::ChecksumMismatch { name, recorded, .. } => {
                assert_eq!(name, "0001_departments");
                assert_eq!(recorded, "0".repeat(64));
            }
            other => panic!("expected checksum mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut migrations = set();
        migrations.push(Migration::new("0001_departments", "SELECT 1;"));

        assert!(matches!(
            MigrationPlan::build(migrations, &[]),
            Err(MigrationError::Duplicate(name)) if name == "0001_departments"
        ));
    }

    #[test]
    fn test_unknown_history_is_reported() {
        let migrations = set();
        let mut history: Vec<_> = migrations.iter().map(applied).collect();
        history.push(AppliedMigration {
            name: "0099_removed".to_string(),
            checksum: "abc".to_string(),
            applied_at: Utc::now(),
            execution_time_ms: 1,
        });

        let plan = MigrationPlan::build(migrations, &history).unwrap();
        assert!(plan.is_up_to_date());
        assert_eq!(plan.unknown, vec!["0099_removed"]);
    }
}
