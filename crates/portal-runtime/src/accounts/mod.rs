use sqlx::PgPool;
use tracing::info;

use portal_core::account::{NewSuperuser, ProvisionError, StoreFuture, SuperuserStore};

/// SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Superuser storage backed by the `portal_users` table.
#[derive(Clone)]
pub struct PgSuperuserStore {
    pool: PgPool,
}

impl PgSuperuserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, username: &str) -> Result<bool, ProvisionError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM portal_users WHERE LOWER(username) = LOWER($1))",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ProvisionError::Database(e.to_string()))
    }

    async fn insert(&self, user: &NewSuperuser) -> Result<i64, ProvisionError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO portal_users (username, email, password, is_superuser, is_staff, is_active)
            VALUES ($1, $2, $3, TRUE, TRUE, TRUE)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                ProvisionError::UsernameTaken(user.username.clone())
            }
            _ => ProvisionError::Database(e.to_string()),
        })?;

        info!("Created superuser {} (id {})", user.username, id);
        Ok(id)
    }
}

impl SuperuserStore for PgSuperuserStore {
    fn username_exists<'a>(&'a self, username: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(self.exists(username))
    }

    fn create_superuser<'a>(&'a self, user: &'a NewSuperuser) -> StoreFuture<'a, i64> {
        Box::pin(self.insert(user))
    }
}
