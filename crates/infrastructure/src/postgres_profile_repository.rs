//! Profiles and their default role assignment.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use feedesk_application::{NewProfile, ProfileRecord, ProfileRepository};
use feedesk_core::{AppError, AppResult};
use feedesk_domain::{DepartmentId, Role, UserId};

use crate::database_error::{internal, is_unique_violation};

/// PostgreSQL implementation of the profile repository port.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    department_id: Option<String>,
    roll_number: Option<String>,
    employee_id: Option<String>,
    is_active: bool,
    profile_completed: bool,
}

impl TryFrom<ProfileRow> for ProfileRecord {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(|error| {
            AppError::Internal(format!("profile '{}' has an unreadable role: {error}", row.id))
        })?;
        let department_id = row
            .department_id
            .map(DepartmentId::new)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!(
                    "profile '{}' has an unreadable department: {error}",
                    row.id
                ))
            })?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            role,
            department_id,
            roll_number: row.roll_number,
            employee_id: row.employee_id,
            is_active: row.is_active,
            profile_completed: row.profile_completed,
        })
    }
}

const PROFILE_COLUMNS: &str = "id, name, email, role, department_id, roll_number, employee_id, \
     is_active, profile_completed";

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn create_profile(&self, profile: NewProfile) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(internal("begin transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO profiles (
                id, name, email, role, department_id,
                roll_number, employee_id, profile_completed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(profile.role.as_str())
        .bind(profile.department_id.as_ref().map(DepartmentId::as_str))
        .bind(&profile.roll_number)
        .bind(&profile.employee_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::Conflict(format!("profile '{}' already exists", profile.id))
            } else {
                AppError::Internal(format!("failed to create profile: {error}"))
            }
        })?;

        assign_default_role(
            &mut transaction,
            profile.id,
            profile.role,
            profile.department_id.as_ref(),
            None,
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(internal("commit profile"))?;

        Ok(())
    }

    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<ProfileRecord>> {
        sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("find profile"))?
        .map(ProfileRecord::try_from)
        .transpose()
    }

    async fn list_profiles(&self) -> AppResult<Vec<ProfileRecord>> {
        sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY name, email"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(internal("list profiles"))?
        .into_iter()
        .map(ProfileRecord::try_from)
        .collect()
    }

    async fn update_role(&self, user_id: UserId, role: Role, changed_by: UserId) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(internal("begin transaction"))?;

        let current = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT role, department_id FROM profiles WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(internal("lock profile"))?
        .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;
        let (previous_role, department) = current;
        let department = department
            .map(DepartmentId::new)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!(
                    "profile '{user_id}' has an unreadable department: {error}"
                ))
            })?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET role = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(internal("update profile role"))?;

        sqlx::query(
            r#"
            UPDATE user_roles
            SET is_active = FALSE
            WHERE user_id = $1
              AND is_active
              AND role_id = (SELECT id FROM roles WHERE name = $2)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&previous_role)
        .execute(&mut *transaction)
        .await
        .map_err(internal("retire previous role assignment"))?;

        assign_default_role(
            &mut transaction,
            user_id,
            role,
            department.as_ref(),
            Some(changed_by),
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(internal("commit role change"))?;

        Ok(())
    }

    async fn set_active(&self, user_id: UserId, is_active: bool) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE profiles
            SET is_active = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(internal("update profile status"))?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound(format!("user '{user_id}' does not exist")));
        }

        Ok(())
    }

    async fn delete_profile(&self, user_id: UserId) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(internal("begin transaction"))?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(internal("delete role assignments"))?;

        sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(internal("delete profile"))?;

        transaction
            .commit()
            .await
            .map_err(internal("commit profile removal"))?;

        Ok(())
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM profiles WHERE role = 'admin')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(internal("check for an admin profile"))
    }
}

/// Assigns `role` to a user, scoped to their department unless the role
/// bypasses permission checks.
async fn assign_default_role(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    role: Role,
    department: Option<&DepartmentId>,
    assigned_by: Option<UserId>,
) -> AppResult<()> {
    let scope = if role.short_circuits_access() {
        None
    } else {
        department.map(DepartmentId::as_str)
    };

    let assigned = sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id, department_id, assigned_by)
        SELECT $1, roles.id, $3, $4
        FROM roles
        WHERE roles.name = $2
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(role.as_str())
    .bind(scope)
    .bind(assigned_by.map(|user_id| user_id.as_uuid()))
    .execute(&mut **transaction)
    .await
    .map_err(internal("assign default role"))?
    .rows_affected();

    if assigned == 0 {
        return Err(AppError::Internal(format!(
            "role '{role}' is missing from the roles table"
        )));
    }

    Ok(())
}
