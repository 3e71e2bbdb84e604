//! Write side of role-based access control.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use feedesk_application::{PermissionRecord, RoleRecord, SecurityAdminRepository, UserRoleRecord};
use feedesk_core::AppResult;
use feedesk_domain::{DepartmentId, UserId};

use crate::database_error::internal;
use crate::postgres_authorization_repository::{
    PermissionRow, RoleRow, USER_ROLE_COLUMNS, UserRoleRow,
};

/// PostgreSQL implementation of the security administration port.
#[derive(Clone)]
pub struct PostgresSecurityAdminRepository {
    pool: PgPool,
}

impl PostgresSecurityAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecurityAdminRepository for PostgresSecurityAdminRepository {
    async fn find_role(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, is_active FROM roles WHERE id = $1",
        )
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find role"))?;

        Ok(row.map(RoleRecord::from))
    }

    async fn find_permission(&self, permission_id: Uuid) -> AppResult<Option<PermissionRecord>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, resource_type, action_type, description
            FROM permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find permission"))?;

        Ok(row.map(PermissionRecord::from))
    }

    async fn find_assignment(&self, assignment_id: Uuid) -> AppResult<Option<UserRoleRecord>> {
        sqlx::query_as::<_, UserRoleRow>(&format!(
            "SELECT {USER_ROLE_COLUMNS} FROM user_roles WHERE id = $1"
        ))
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find role assignment"))?
        .map(UserRoleRecord::try_from)
        .transpose()
    }

    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: Uuid,
        department_id: Option<&DepartmentId>,
        assigned_by: UserId,
    ) -> AppResult<UserRoleRecord> {
        let row = sqlx::query_as::<_, UserRoleRow>(&format!(
            r#"
            INSERT INTO user_roles (user_id, role_id, department_id, assigned_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_ROLE_COLUMNS}
            "#
        ))
        .bind(user_id.as_uuid())
        .bind(role_id)
        .bind(department_id.map(DepartmentId::as_str))
        .bind(assigned_by.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(internal("assign role"))?;

        UserRoleRecord::try_from(row)
    }

    async fn deactivate_assignment(&self, assignment_id: Uuid) -> AppResult<bool> {
        let updated =
            sqlx::query("UPDATE user_roles SET is_active = FALSE WHERE id = $1 AND is_active")
                .bind(assignment_id)
                .execute(&self.pool)
                .await
                .map_err(internal("deactivate role assignment"))?
                .rows_affected();

        Ok(updated == 1)
    }

    async fn grant_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(internal("grant permission"))?
        .rows_affected();

        Ok(inserted == 1)
    }

    async fn revoke_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<bool> {
        let removed = sqlx::query(
            "DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2",
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(internal("revoke permission"))?
        .rows_affected();

        Ok(removed == 1)
    }
}
