//! Read side of role-based access control.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use feedesk_application::{
    AuthorizationRepository, PermissionRecord, RolePermissionRecord, RoleRecord, UserRoleRecord,
};
use feedesk_core::{AppError, AppResult};
use feedesk_domain::{DepartmentId, UserId};

use crate::database_error::internal;

/// PostgreSQL implementation of the authorization repository port.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) const USER_ROLE_COLUMNS: &str =
    "id, user_id, role_id, department_id, is_active, assigned_by, assigned_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRoleRow {
    id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
    department_id: Option<String>,
    is_active: bool,
    assigned_by: Option<Uuid>,
    assigned_at: DateTime<Utc>,
}

impl TryFrom<UserRoleRow> for UserRoleRecord {
    type Error = AppError;

    fn try_from(row: UserRoleRow) -> Result<Self, Self::Error> {
        let department_id = row
            .department_id
            .map(DepartmentId::new)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!(
                    "role assignment '{}' has an unreadable department: {error}",
                    row.id
                ))
            })?;

        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            role_id: row.role_id,
            department_id,
            is_active: row.is_active,
            assigned_by: row.assigned_by.map(UserId::from_uuid),
            assigned_at: row.assigned_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RoleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    is_active: bool,
}

impl From<RoleRow> for RoleRecord {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RolePermissionRow {
    role_id: Uuid,
    permission_id: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PermissionRow {
    id: Uuid,
    name: String,
    resource_type: String,
    action_type: String,
    description: Option<String>,
}

impl From<PermissionRow> for PermissionRecord {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            resource_type: row.resource_type,
            action_type: row.action_type,
            description: row.description,
        }
    }
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_active_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRoleRecord>> {
        sqlx::query_as::<_, UserRoleRow>(&format!(
            r#"
            SELECT {USER_ROLE_COLUMNS}
            FROM user_roles
            WHERE user_id = $1
              AND is_active
            ORDER BY assigned_at
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(internal("list role assignments"))?
        .into_iter()
        .map(UserRoleRecord::try_from)
        .collect()
    }

    async fn find_roles(&self, role_ids: &[Uuid]) -> AppResult<Vec<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, is_active FROM roles WHERE id = ANY($1)",
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(internal("load roles"))?;

        Ok(rows.into_iter().map(RoleRecord::from).collect())
    }

    async fn list_role_permissions(
        &self,
        role_ids: &[Uuid],
    ) -> AppResult<Vec<RolePermissionRecord>> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            "SELECT role_id, permission_id FROM role_permissions WHERE role_id = ANY($1)",
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(internal("load role permissions"))?;

        Ok(rows
            .into_iter()
            .map(|row| RolePermissionRecord {
                role_id: row.role_id,
                permission_id: row.permission_id,
            })
            .collect())
    }

    async fn find_permissions(&self, permission_ids: &[Uuid]) -> AppResult<Vec<PermissionRecord>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, resource_type, action_type, description
            FROM permissions
            WHERE id = ANY($1)
            "#,
        )
        .bind(permission_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(internal("load permissions"))?;

        Ok(rows.into_iter().map(PermissionRecord::from).collect())
    }
}
