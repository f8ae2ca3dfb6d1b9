//! Migration runner with advisory locking.
//!
//! A PostgreSQL advisory lock keeps concurrent setup runs from migrating the
//! same database at once. Advisory locks belong to a session, so the lock, the
//! migrations and the unlock all share one pooled connection.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Instant;

use regex_lite::Regex;

use sha2::{Digest, Sha256};
use sqlx::postgres::PgConnection;
use sqlx::{Connection, PgPool, Row};
use tracing::{debug, info, warn};

use super::builtin::get_builtin_migrations;
use super::error::MigrationError;
use super::plan::{AppliedMigration, MigrationPlan, MigrationSummary};

/// Lock ID for the migration advisory lock ("PORTAL" in hex).
const MIGRATION_LOCK_ID: i64 = 0x504F_5254_414C;

/// A single migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Unique name (e.g. "0000_portal_auth" or "0002_create_students").
    pub name: String,
    /// SQL to execute.
    pub sql: String,
}

impl Migration {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }

    /// Hex SHA-256 of the migration SQL.
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.sql.as_bytes()))
    }
}

/// Applies built-in and project migrations.
pub struct MigrationRunner {
    pool: PgPool,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Compute what a run would apply without changing the schema.
    pub async fn plan(&self, project_migrations: Vec<Migration>) -> Result<MigrationPlan, MigrationError> {
        let mut conn = self.pool.acquire().await.map_err(MigrationError::Tracking)?;
        let applied = if tracking_table_exists(&mut conn).await? {
            applied_migrations(&mut conn).await?
        } else {
            Vec::new()
        };
        MigrationPlan::build(with_builtins(project_migrations), &applied)
    }

    /// Apply every pending migration under the advisory lock.
    ///
    /// Each migration runs in its own transaction. The first failure stops
    /// the run; migrations applied before it stay applied.
    pub async fn run(
        &self,
        project_migrations: Vec<Migration>,
    ) -> Result<MigrationSummary, MigrationError> {
        let mut conn = self.pool.acquire().await.map_err(MigrationError::Lock)?;

        acquire_lock(&mut conn).await?;

        let result = run_locked(&mut conn, with_builtins(project_migrations)).await;

        // Always release lock, even on error
        if let Err(e) = release_lock(&mut conn).await {
            warn!("Failed to release migration lock: {}", e);
        }

        result
    }

    /// Read the recorded migration history.
    pub async fn applied(&self) -> Result<Vec<AppliedMigration>, MigrationError> {
        let mut conn = self.pool.acquire().await.map_err(MigrationError::Tracking)?;
        if !tracking_table_exists(&mut conn).await? {
            return Ok(Vec::new());
        }
        applied_migrations(&mut conn).await
    }
}

fn with_builtins(project_migrations: Vec<Migration>) -> Vec<Migration> {
    let mut migrations = get_builtin_migrations();
    migrations.extend(project_migrations);
    migrations
}

async fn run_locked(
    conn: &mut PgConnection,
    migrations: Vec<Migration>,
) -> Result<MigrationSummary, MigrationError> {
    ensure_migrations_table(conn).await?;

    let applied = applied_migrations(conn).await?;
    debug!("Already applied migrations: {}", applied.len());

    let plan = MigrationPlan::build(migrations, &applied)?;
    for name in &plan.unknown {
        warn!("Applied migration {} is not in the migration set", name);
    }

    let mut summary = MigrationSummary {
        applied: Vec::new(),
        already_applied: plan.applied_count,
        unknown: plan.unknown.clone(),
    };

    for migration in &plan.pending {
        apply_migration(conn, migration).await?;
        summary.applied.push(migration.name.clone());
    }

    Ok(summary)
}

async fn acquire_lock(conn: &mut PgConnection) -> Result<(), MigrationError> {
    debug!("Acquiring migration lock...");
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(&mut *conn)
        .await
        .map_err(MigrationError::Lock)?;
    debug!("Migration lock acquired");
    Ok(())
}

async fn release_lock(conn: &mut PgConnection) -> sqlx::Result<()> {
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(&mut *conn)
        .await?;
    debug!("Migration lock released");
    Ok(())
}

async fn tracking_table_exists(conn: &mut PgConnection) -> Result<bool, MigrationError> {
    sqlx::query_scalar::<_, bool>("SELECT to_regclass('portal_migrations') IS NOT NULL")
        .fetch_one(&mut *conn)
        .await
        .map_err(MigrationError::Tracking)
}

async fn ensure_migrations_table(conn: &mut PgConnection) -> Result<(), MigrationError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS portal_migrations (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) UNIQUE NOT NULL,
            checksum VARCHAR(64) NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            execution_time_ms INTEGER NOT NULL
        )
        "#,
    )
    .execute(&mut *conn)
    .await
    .map_err(MigrationError::Tracking)?;
    Ok(())
}

async fn applied_migrations(
    conn: &mut PgConnection,
) -> Result<Vec<AppliedMigration>, MigrationError> {
    let rows = sqlx::query(
        r#"
        SELECT name, checksum, applied_at, execution_time_ms
        FROM portal_migrations
        ORDER BY name ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(MigrationError::Tracking)?;

    rows.iter()
        .map(|row| {
            Ok(AppliedMigration {
                name: row.try_get("name")?,
                checksum: row.try_get("checksum")?,
                applied_at: row.try_get("applied_at")?,
                execution_time_ms: row.try_get("execution_time_ms")?,
            })
        })
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(MigrationError::Tracking)
}

async fn apply_migration(
    conn: &mut PgConnection,
    migration: &Migration,
) -> Result<(), MigrationError> {
    info!("Applying migration: {}", migration.name);
    let start = Instant::now();
    let failed = |source| MigrationError::Apply {
        name: migration.name.clone(),
        source,
    };

    let mut tx = conn.begin().await.map_err(failed)?;

    for statement in split_sql_statements(&migration.sql) {
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
    }

    let elapsed_ms = i32::try_from(start.elapsed().as_millis()).unwrap_or(i32::MAX);

    sqlx::query(
        "INSERT INTO portal_migrations (name, checksum, execution_time_ms) VALUES ($1, $2, $3)",
    )
    .bind(&migration.name)
    .bind(migration.checksum())
    .bind(elapsed_ms)
    .execute(&mut *tx)
    .await
    .map_err(failed)?;

    tx.commit().await.map_err(failed)?;

    info!("Migration applied: {} ({} ms)", migration.name, elapsed_ms);
    Ok(())
}

/// Split SQL into individual statements.
///
/// Semicolons inside dollar-quoted bodies, string literals, quoted
/// identifiers and comments do not end a statement. Fragments holding only
/// comments are dropped.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        let end = match c {
            '-' if next == Some('-') => {
                let end = chars[i..]
                    .iter()
                    .position(|&c| c == '\n')
                    .map_or(chars.len(), |offset| i + offset);
                current.extend(&chars[i..end]);
                i = end;
                continue;
            }
            '/' if next == Some('*') => {
                let end = block_comment_end(&chars, i);
                current.extend(&chars[i..end]);
                i = end;
                continue;
            }
            '\'' => quoted_end(&chars, i, '\'', is_escape_string(&chars, i)),
            '"' => quoted_end(&chars, i, '"', false),
            '$' => match dollar_tag_at(&chars, i) {
                Some(tag) => dollar_quote_end(&chars, i, &tag),
                None => i + 1,
            },
            ';' => {
                if has_code {
                    statements.push(current.trim().to_string());
                }
                current.clear();
                has_code = false;
                i += 1;
                continue;
            }
            _ => i + 1,
        };

        current.extend(&chars[i..end]);
        has_code |= !c.is_whitespace();
        i = end;
    }

    // The last statement may not end with ;
    if has_code {
        statements.push(current.trim().to_string());
    }

    statements
}

/// End of a possibly nested `/* */` comment starting at `start`.
fn block_comment_end(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match (chars[i], chars.get(i + 1)) {
            ('/', Some('*')) => {
                depth += 1;
                i += 2;
            }
            ('*', Some('/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    chars.len()
}

/// End of a literal or identifier opened by `quote` at `start`.
///
/// A doubled quote is an escaped quote. `backslash_escapes` covers `E'...'`.
fn quoted_end(chars: &[char], start: usize, quote: char, backslash_escapes: bool) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if backslash_escapes && c == '\\' {
            i += 2;
            continue;
        }
        if c == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// Whether the quote at `start` opens an `E'...'` escape string.
fn is_escape_string(chars: &[char], start: usize) -> bool {
    match start.checked_sub(1).map(|p| chars[p]) {
        Some('E' | 'e') => start < 2 || !is_identifier_char(chars[start - 2]),
        _ => false,
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Read a `$tag$` opening at `start`.
fn dollar_tag_at(chars: &[char], start: usize) -> Option<String> {
    if start > 0 && is_identifier_char(chars[start - 1]) {
        return None;
    }
    let mut tag = String::from("$");
    for (offset, &c) in chars[start + 1..].iter().enumerate() {
        if c == '$' {
            tag.push('$');
            return Some(tag);
        }
        // $1, $2 are bind parameters, not quote tags
        if !(c.is_alphanumeric() || c == '_') || (offset == 0 && c.is_ascii_digit()) {
            return None;
        }
        tag.push(c);
    }
    None
}

/// End of the dollar-quoted body opened by `tag` at `start`.
fn dollar_quote_end(chars: &[char], start: usize, tag: &str) -> usize {
    let tag: Vec<char> = tag.chars().collect();
    let body = start + tag.len();
    (body..chars.len().saturating_sub(tag.len() - 1))
        .find(|&j| chars[j..j + tag.len()] == tag[..])
        .map_or(chars.len(), |j| j + tag.len())
}

/// Load project migrations from a directory.
///
/// Migrations are named like `0001_create_departments.sql` and run in name
/// order. A missing directory means no project migrations.
pub fn load_migrations_from_dir(dir: &Path) -> Result<Vec<Migration>, MigrationError> {
    if !dir.exists() {
        debug!("Migrations directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }

    let load_err = |source| MigrationError::Load {
        path: dir.to_path_buf(),
        source,
    };

    let mut migrations = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(load_err)? {
        let path = entry.map_err(load_err)?.path();

        if path.extension().map(|e| e == "sql").unwrap_or(false) {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| MigrationError::InvalidName(path.display().to_string()))?
                .to_string();

            if !is_valid_name(&name) {
                return Err(MigrationError::InvalidName(name));
            }

            let sql = std::fs::read_to_string(&path).map_err(|source| MigrationError::Load {
                path: path.clone(),
                source,
            })?;

            migrations.push(Migration::new(name, sql));
        }
    }

    // Sort by name (which includes the numeric prefix)
    migrations.sort_by(|a, b| a.name.cmp(&b.name));

    debug!("Loaded {} project migrations", migrations.len());
    Ok(migrations)
}

static MIGRATION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+_[A-Za-z0-9_\-]+$").expect("migration name pattern is valid")
});

fn is_valid_name(name: &str) -> bool {
    MIGRATION_NAME.is_match(name)
}
