//! PostgreSQL-backed invitation repository over `user_invitations`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use feedesk_application::{InvitationRepository, NewInvitationRecord};
use feedesk_core::{AppError, AppResult};
use feedesk_domain::{DepartmentId, EmailAddress, Invitation, InvitationId, Role, UserId};

use crate::database_error::{internal, is_unique_violation};

/// PostgreSQL implementation of the invitation repository port.
#[derive(Clone)]
pub struct PostgresInvitationRepository {
    pool: PgPool,
}

impl PostgresInvitationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INVITATION_COLUMNS: &str = "id, email, role, department, roll_number, employee_id, \
     invited_by, is_active, expires_at, used_at, created_at";

#[derive(Debug, sqlx::FromRow)]
struct InvitationRow {
    id: uuid::Uuid,
    email: String,
    role: String,
    department: String,
    roll_number: Option<String>,
    employee_id: Option<String>,
    invited_by: Option<uuid::Uuid>,
    is_active: bool,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = AppError;

    fn try_from(row: InvitationRow) -> Result<Self, Self::Error> {
        let decode = |field: &str, error: AppError| {
            AppError::Internal(format!(
                "invitation '{}' has an unreadable {field}: {error}",
                row.id
            ))
        };

        Ok(Self {
            id: InvitationId::from_uuid(row.id),
            email: EmailAddress::new(row.email.as_str()).map_err(|error| decode("email", error))?,
            role: Role::from_str(&row.role).map_err(|error| decode("role", error))?,
            department: DepartmentId::new(&row.department)
                .map_err(|error| decode("department", error))?,
            roll_number: row.roll_number,
            employee_id: row.employee_id,
            invited_by: row.invited_by.map(UserId::from_uuid),
            is_active: row.is_active,
            expires_at: row.expires_at,
            used_at: row.used_at,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl InvitationRepository for PostgresInvitationRepository {
    async fn create_invitation(&self, record: NewInvitationRecord) -> AppResult<Invitation> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(internal("begin transaction"))?;

        let retired = sqlx::query(
            r#"
            UPDATE user_invitations
            SET is_active = FALSE
            WHERE LOWER(email) = LOWER($1)
              AND is_active
              AND used_at IS NULL
            "#,
        )
        .bind(record.email.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(internal("retire previous invitations"))?
        .rows_affected();

        let row = sqlx::query_as::<_, InvitationRow>(&format!(
            r#"
            INSERT INTO user_invitations (
                email, role, department, roll_number, employee_id,
                invited_by, token_hash, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(record.email.as_str())
        .bind(record.role.as_str())
        .bind(record.department.as_str())
        .bind(record.roll_number)
        .bind(record.employee_id)
        .bind(record.invited_by.map(|user_id| user_id.as_uuid()))
        .bind(record.token_hash)
        .bind(record.expires_at)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::Conflict(format!(
                    "another invitation for '{}' is being issued, try again",
                    record.email
                ))
            } else {
                AppError::Internal(format!("failed to store invitation: {error}"))
            }
        })?;

        transaction
            .commit()
            .await
            .map_err(internal("commit invitation"))?;

        if retired > 0 {
            tracing::debug!(email = %record.email, retired, "retired previous invitations");
        }

        Invitation::try_from(row)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM user_invitations WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find invitation by token"))?
        .map(Invitation::try_from)
        .transpose()
    }

    async fn find_by_id(&self, invitation_id: InvitationId) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM user_invitations WHERE id = $1"
        ))
        .bind(invitation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find invitation"))?
        .map(Invitation::try_from)
        .transpose()
    }

    async fn mark_used(
        &self,
        invitation_id: InvitationId,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        // The predicate on used_at serializes concurrent consumers.
        let result = sqlx::query(
            r#"
            UPDATE user_invitations
            SET used_at = $2
            WHERE id = $1
              AND used_at IS NULL
            "#,
        )
        .bind(invitation_id.as_uuid())
        .bind(used_at)
        .execute(&self.pool)
        .await
        .map_err(internal("mark invitation used"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn deactivate(&self, invitation_id: InvitationId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_invitations
            SET is_active = FALSE
            WHERE id = $1
              AND is_active
            "#,
        )
        .bind(invitation_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(internal("deactivate invitation"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_pending(&self, now: DateTime<Utc>) -> AppResult<Vec<Invitation>> {
        sqlx::query_as::<_, InvitationRow>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM user_invitations
            WHERE is_active
              AND used_at IS NULL
              AND expires_at >= $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(internal("list pending invitations"))?
        .into_iter()
        .map(Invitation::try_from)
        .collect()
    }
}
