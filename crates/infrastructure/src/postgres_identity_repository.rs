//! Credential store over the `identities` table.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use feedesk_application::{IdentityRecord, IdentityRepository};
use feedesk_core::{AccountError, AppError, AppResult};
use feedesk_domain::UserId;

use crate::database_error::{internal, is_unique_violation};

/// PostgreSQL implementation of the identity repository port.
#[derive(Clone)]
pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    password_hash: String,
}

impl From<IdentityRow> for IdentityRecord {
    fn from(row: IdentityRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<IdentityRecord>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, email, password_hash
            FROM identities
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find identity by email"))?;

        Ok(row.map(IdentityRecord::from))
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<IdentityRecord>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, email, password_hash FROM identities WHERE id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find identity"))?;

        Ok(row.map(IdentityRecord::from))
    }

    async fn create_identity(&self, email: &str, password_hash: &str) -> AppResult<UserId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO identities (email, password_hash)
            VALUES (LOWER($1), $2)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::from(AccountError::DuplicateAccount)
            } else {
                AppError::Internal(format!("failed to create identity: {error}"))
            }
        })?;

        Ok(UserId::from_uuid(id))
    }

    async fn delete_identity(&self, user_id: UserId) -> AppResult<()> {
        sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(internal("delete identity"))?;

        Ok(())
    }
}
