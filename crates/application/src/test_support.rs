//! In-memory adapters shared by the service tests.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use feedesk_core::{AccountError, AppError, AppResult};
use feedesk_domain::{
    Capability, DepartmentId, EffectiveUser, Invitation, InvitationId, Role, UserId,
};

use crate::invitation_service::token_crypto::generate_token;
use crate::{
    AuditEvent, AuditRepository, AuthorizationRepository, AuthorizationService, EmailService,
    IdentityRecord, IdentityRepository, InvitationRepository, InvitationService,
    InvitationSettings, NewInvitationRecord, NewProfile, PasswordHasher, PermissionRecord,
    ProfileRecord, ProfileRepository, ProvisioningService, RolePermissionRecord, RoleRecord,
    SecurityAdminRepository, SessionService, UserAdminService, UserRoleRecord,
};

/// Switches that make individual adapter calls fail.
#[derive(Debug, Default, Clone)]
pub(crate) struct Faults {
    pub profile_write: bool,
    pub identity_delete: bool,
    pub permission_loads: bool,
    pub mark_used: bool,
    pub email_to: Option<String>,
    pub slow_email_to: Option<String>,
    pub panic_email_to: Option<String>,
}

#[derive(Default)]
pub(crate) struct InMemoryBackend {
    pub invitations: Mutex<Vec<(String, Invitation)>>,
    pub identities: Mutex<Vec<IdentityRecord>>,
    pub profiles: Mutex<Vec<ProfileRecord>>,
    pub roles: Mutex<Vec<RoleRecord>>,
    pub permissions: Mutex<Vec<PermissionRecord>>,
    pub role_permissions: Mutex<Vec<RolePermissionRecord>>,
    pub user_roles: Mutex<Vec<UserRoleRecord>>,
    pub audit_events: Mutex<Vec<AuditEvent>>,
    pub sent_emails: Mutex<Vec<(String, String)>>,
    pub faults: Mutex<Faults>,
}

fn seeded_capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Student => &[
            Capability::ViewDashboard,
            Capability::ViewOwnProfile,
            Capability::ViewFeeRecords,
        ],
        Role::Faculty => &[
            Capability::ViewDashboard,
            Capability::ViewOwnProfile,
            Capability::ViewFeeRecords,
            Capability::ViewReports,
        ],
        Role::Hod => &[
            Capability::ViewDashboard,
            Capability::ViewOwnProfile,
            Capability::ViewFeeRecords,
            Capability::ViewReports,
            Capability::EditFeeRecord,
            Capability::AssignFees,
            Capability::InviteUsers,
            Capability::ManageUsers,
        ],
        Role::Principal | Role::Admin => Capability::all(),
    }
}

impl InMemoryBackend {
    /// Backend with one role per [`Role`] and the default capability seed.
    pub(crate) async fn seeded() -> Arc<Self> {
        let backend = Arc::new(Self::default());
        for capability in Capability::all() {
            backend.permissions.lock().await.push(PermissionRecord {
                id: Uuid::new_v4(),
                name: capability.as_str().to_owned(),
                resource_type: "portal".to_owned(),
                action_type: capability.as_str().to_owned(),
                description: None,
            });
        }
        for role in Role::all() {
            let role_id = backend.add_role(role.as_str()).await;
            for capability in seeded_capabilities(*role) {
                backend.grant(role_id, *capability).await;
            }
        }
        backend
    }

    pub(crate) async fn add_role(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.roles.lock().await.push(RoleRecord {
            id,
            name: name.to_owned(),
            description: None,
            is_active: true,
        });
        id
    }

    pub(crate) async fn role_id(&self, name: &str) -> Uuid {
        self.roles
            .lock()
            .await
            .iter()
            .find(|role| role.name == name)
            .map(|role| role.id)
            .unwrap_or_else(|| panic!("role '{name}' is not seeded"))
    }

    pub(crate) async fn permission_id(&self, capability: Capability) -> Uuid {
        self.permissions
            .lock()
            .await
            .iter()
            .find(|permission| permission.name == capability.as_str())
            .map(|permission| permission.id)
            .unwrap_or_else(|| panic!("permission '{capability}' is not seeded"))
    }

    pub(crate) async fn grant(&self, role_id: Uuid, capability: Capability) {
        let permission_id = self.permission_id(capability).await;
        self.role_permissions.lock().await.push(RolePermissionRecord {
            role_id,
            permission_id,
        });
    }

    pub(crate) async fn assign(&self, user_id: UserId, role_id: Uuid, department: Option<&str>) {
        self.user_roles.lock().await.push(UserRoleRecord {
            id: Uuid::new_v4(),
            user_id,
            role_id,
            department_id: department.map(department_id),
            is_active: true,
            assigned_by: None,
            assigned_at: Utc::now(),
        });
    }

    /// Creates an identity, an active profile and no assignments.
    pub(crate) async fn add_bare_user(
        &self,
        email: &str,
        role: Role,
        department: Option<&str>,
    ) -> UserId {
        let id = UserId::new();
        self.identities.lock().await.push(IdentityRecord {
            id,
            email: email.to_owned(),
            password_hash: hash_for("correct horse battery"),
        });
        self.profiles.lock().await.push(ProfileRecord {
            id,
            name: email.split('@').next().unwrap_or(email).to_owned(),
            email: email.to_owned(),
            role,
            department_id: department.map(department_id),
            roll_number: None,
            employee_id: Some("EMP-1".to_owned()),
            is_active: true,
            profile_completed: true,
        });
        id
    }

    /// Creates a user holding the seeded role of the same name.
    pub(crate) async fn add_user(
        &self,
        email: &str,
        role: Role,
        department: Option<&str>,
    ) -> UserId {
        let id = self.add_bare_user(email, role, department).await;
        let scope = if role.short_circuits_access() {
            None
        } else {
            department
        };
        let role_id = self.role_id(role.as_str()).await;
        self.assign(id, role_id, scope).await;
        id
    }

    /// Stores an invitation and returns it with its raw token.
    pub(crate) async fn add_invitation(
        &self,
        email: &str,
        role: Role,
        department: &str,
        expires_at: DateTime<Utc>,
    ) -> (Invitation, String) {
        let (raw_token, token_hash) =
            generate_token().unwrap_or_else(|_| panic!("token generation failed"));
        let invitation = Invitation {
            id: InvitationId::new(),
            email: feedesk_domain::EmailAddress::new(email)
                .unwrap_or_else(|_| panic!("invalid test email")),
            role,
            department: department_id(department),
            roll_number: None,
            employee_id: None,
            invited_by: None,
            is_active: true,
            expires_at,
            used_at: None,
            created_at: Utc::now(),
        };
        self.invitations
            .lock()
            .await
            .push((token_hash, invitation.clone()));
        (invitation, raw_token)
    }

    pub(crate) async fn update_invitation(
        &self,
        id: InvitationId,
        update: impl FnOnce(&mut Invitation),
    ) {
        let mut invitations = self.invitations.lock().await;
        if let Some((_, invitation)) = invitations.iter_mut().find(|(_, row)| row.id == id) {
            update(invitation);
        }
    }

    pub(crate) async fn invitation(&self, id: InvitationId) -> Invitation {
        self.invitations
            .lock()
            .await
            .iter()
            .find(|(_, row)| row.id == id)
            .map(|(_, row)| row.clone())
            .unwrap_or_else(|| panic!("invitation {id} not stored"))
    }

    pub(crate) async fn set_faults(&self, update: impl FnOnce(&mut Faults)) {
        update(&mut *self.faults.lock().await);
    }

    pub(crate) async fn actions(&self) -> Vec<&'static str> {
        self.audit_events
            .lock()
            .await
            .iter()
            .map(|event| event.action.as_str())
            .collect()
    }
}

pub(crate) fn department_id(value: &str) -> DepartmentId {
    DepartmentId::new(value).unwrap_or_else(|_| panic!("invalid test department '{value}'"))
}

pub(crate) fn hash_for(password: &str) -> String {
    format!("hashed:{password}")
}

#[async_trait]
impl InvitationRepository for InMemoryBackend {
    async fn create_invitation(&self, record: NewInvitationRecord) -> AppResult<Invitation> {
        let mut invitations = self.invitations.lock().await;
        for (_, existing) in invitations.iter_mut() {
            if existing.email == record.email && existing.used_at.is_none() {
                existing.is_active = false;
            }
        }

        let invitation = Invitation {
            id: InvitationId::new(),
            email: record.email,
            role: record.role,
            department: record.department,
            roll_number: record.roll_number,
            employee_id: record.employee_id,
            invited_by: record.invited_by,
            is_active: true,
            expires_at: record.expires_at,
            used_at: None,
            created_at: Utc::now(),
        };
        invitations.push((record.token_hash, invitation.clone()));
        Ok(invitation)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invitation>> {
        Ok(self
            .invitations
            .lock()
            .await
            .iter()
            .find(|(hash, _)| hash == token_hash)
            .map(|(_, invitation)| invitation.clone()))
    }

    async fn find_by_id(&self, invitation_id: InvitationId) -> AppResult<Option<Invitation>> {
        Ok(self
            .invitations
            .lock()
            .await
            .iter()
            .find(|(_, invitation)| invitation.id == invitation_id)
            .map(|(_, invitation)| invitation.clone()))
    }

    async fn mark_used(
        &self,
        invitation_id: InvitationId,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        if self.faults.lock().await.mark_used {
            return Err(AppError::Internal("invitation store unavailable".to_owned()));
        }

        let mut invitations = self.invitations.lock().await;
        let Some((_, invitation)) = invitations
            .iter_mut()
            .find(|(_, invitation)| invitation.id == invitation_id)
        else {
            return Ok(false);
        };

        if invitation.used_at.is_some() {
            return Ok(false);
        }
        invitation.used_at = Some(used_at);
        Ok(true)
    }

    async fn deactivate(&self, invitation_id: InvitationId) -> AppResult<bool> {
        let mut invitations = self.invitations.lock().await;
        match invitations
            .iter_mut()
            .find(|(_, invitation)| invitation.id == invitation_id && invitation.is_active)
        {
            Some((_, invitation)) => {
                invitation.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_pending(&self, now: DateTime<Utc>) -> AppResult<Vec<Invitation>> {
        Ok(self
            .invitations
            .lock()
            .await
            .iter()
            .filter(|(_, invitation)| invitation.is_pending(now))
            .map(|(_, invitation)| invitation.clone())
            .collect())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryBackend {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<IdentityRecord>> {
        Ok(self
            .identities
            .lock()
            .await
            .iter()
            .find(|identity| identity.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<IdentityRecord>> {
        Ok(self
            .identities
            .lock()
            .await
            .iter()
            .find(|identity| identity.id == user_id)
            .cloned())
    }

    async fn create_identity(&self, email: &str, password_hash: &str) -> AppResult<UserId> {
        let mut identities = self.identities.lock().await;
        if identities
            .iter()
            .any(|identity| identity.email.eq_ignore_ascii_case(email))
        {
            return Err(AccountError::DuplicateAccount.into());
        }

        let id = UserId::new();
        identities.push(IdentityRecord {
            id,
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
        });
        Ok(id)
    }

    async fn delete_identity(&self, user_id: UserId) -> AppResult<()> {
        if self.faults.lock().await.identity_delete {
            return Err(AppError::Internal("identity store unavailable".to_owned()));
        }
        self.identities
            .lock()
            .await
            .retain(|identity| identity.id != user_id);
        self.profiles
            .lock()
            .await
            .retain(|profile| profile.id != user_id);
        self.user_roles
            .lock()
            .await
            .retain(|assignment| assignment.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryBackend {
    async fn create_profile(&self, profile: NewProfile) -> AppResult<()> {
        if self.faults.lock().await.profile_write {
            return Err(AppError::Internal("profile store unavailable".to_owned()));
        }

        let role_id = self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.name == profile.role.as_str())
            .map(|role| role.id);
        if let Some(role_id) = role_id {
            let scope = if profile.role.short_circuits_access() {
                None
            } else {
                profile.department_id.clone()
            };
            self.user_roles.lock().await.push(UserRoleRecord {
                id: Uuid::new_v4(),
                user_id: profile.id,
                role_id,
                department_id: scope,
                is_active: true,
                assigned_by: None,
                assigned_at: Utc::now(),
            });
        }

        self.profiles.lock().await.push(ProfileRecord {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            role: profile.role,
            department_id: profile.department_id,
            roll_number: profile.roll_number,
            employee_id: profile.employee_id,
            is_active: true,
            profile_completed: true,
        });
        Ok(())
    }

    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<ProfileRecord>> {
        Ok(self
            .profiles
            .lock()
            .await
            .iter()
            .find(|profile| profile.id == user_id)
            .cloned())
    }

    async fn list_profiles(&self) -> AppResult<Vec<ProfileRecord>> {
        let mut profiles = self.profiles.lock().await.clone();
        profiles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(profiles)
    }

    async fn update_role(&self, user_id: UserId, role: Role, changed_by: UserId) -> AppResult<()> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .iter_mut()
            .find(|profile| profile.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))?;

        let roles = self.roles.lock().await;
        let role_id_of = |name: Role| {
            roles
                .iter()
                .find(|record| record.name == name.as_str())
                .map(|record| record.id)
        };
        let previous_role_id = role_id_of(profile.role);
        let new_role_id = role_id_of(role)
            .ok_or_else(|| AppError::Internal(format!("role '{role}' is not seeded")))?;

        let mut assignments = self.user_roles.lock().await;
        for assignment in assignments.iter_mut() {
            if assignment.user_id == user_id
                && assignment.is_active
                && Some(assignment.role_id) == previous_role_id
            {
                assignment.is_active = false;
            }
        }
        let scope = if role.short_circuits_access() {
            None
        } else {
            profile.department_id.clone()
        };
        assignments.push(UserRoleRecord {
            id: Uuid::new_v4(),
            user_id,
            role_id: new_role_id,
            department_id: scope,
            is_active: true,
            assigned_by: Some(changed_by),
            assigned_at: Utc::now(),
        });

        profile.role = role;
        Ok(())
    }

    async fn set_active(&self, user_id: UserId, is_active: bool) -> AppResult<()> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .iter_mut()
            .find(|profile| profile.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))?;
        profile.is_active = is_active;
        Ok(())
    }

    async fn delete_profile(&self, user_id: UserId) -> AppResult<()> {
        self.user_roles
            .lock()
            .await
            .retain(|assignment| assignment.user_id != user_id);
        self.profiles
            .lock()
            .await
            .retain(|profile| profile.id != user_id);
        Ok(())
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        Ok(self
            .profiles
            .lock()
            .await
            .iter()
            .any(|profile| profile.role == Role::Admin && profile.is_active))
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryBackend {
    async fn list_active_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRoleRecord>> {
        if self.faults.lock().await.permission_loads {
            return Err(AppError::Internal("permission store unavailable".to_owned()));
        }
        Ok(self
            .user_roles
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.user_id == user_id && assignment.is_active)
            .cloned()
            .collect())
    }

    async fn find_roles(&self, role_ids: &[Uuid]) -> AppResult<Vec<RoleRecord>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .filter(|role| role_ids.contains(&role.id))
            .cloned()
            .collect())
    }

    async fn list_role_permissions(
        &self,
        role_ids: &[Uuid],
    ) -> AppResult<Vec<RolePermissionRecord>> {
        Ok(self
            .role_permissions
            .lock()
            .await
            .iter()
            .filter(|row| role_ids.contains(&row.role_id))
            .copied()
            .collect())
    }

    async fn find_permissions(&self, permission_ids: &[Uuid]) -> AppResult<Vec<PermissionRecord>> {
        Ok(self
            .permissions
            .lock()
            .await
            .iter()
            .filter(|permission| permission_ids.contains(&permission.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SecurityAdminRepository for InMemoryBackend {
    async fn find_role(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.id == role_id)
            .cloned())
    }

    async fn find_permission(&self, permission_id: Uuid) -> AppResult<Option<PermissionRecord>> {
        Ok(self
            .permissions
            .lock()
            .await
            .iter()
            .find(|permission| permission.id == permission_id)
            .cloned())
    }

    async fn find_assignment(&self, assignment_id: Uuid) -> AppResult<Option<UserRoleRecord>> {
        Ok(self
            .user_roles
            .lock()
            .await
            .iter()
            .find(|assignment| assignment.id == assignment_id)
            .cloned())
    }

    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: Uuid,
        department_id: Option<&DepartmentId>,
        assigned_by: UserId,
    ) -> AppResult<UserRoleRecord> {
        let assignment = UserRoleRecord {
            id: Uuid::new_v4(),
            user_id,
            role_id,
            department_id: department_id.cloned(),
            is_active: true,
            assigned_by: Some(assigned_by),
            assigned_at: Utc::now(),
        };
        self.user_roles.lock().await.push(assignment.clone());
        Ok(assignment)
    }

    async fn deactivate_assignment(&self, assignment_id: Uuid) -> AppResult<bool> {
        let mut assignments = self.user_roles.lock().await;
        match assignments
            .iter_mut()
            .find(|assignment| assignment.id == assignment_id && assignment.is_active)
        {
            Some(assignment) => {
                assignment.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn grant_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<bool> {
        let mut rows = self.role_permissions.lock().await;
        let row = RolePermissionRecord {
            role_id,
            permission_id,
        };
        if rows.contains(&row) {
            return Ok(false);
        }
        rows.push(row);
        Ok(true)
    }

    async fn revoke_permission(&self, role_id: Uuid, permission_id: Uuid) -> AppResult<bool> {
        let mut rows = self.role_permissions.lock().await;
        let before = rows.len();
        rows.retain(|row| !(row.role_id == role_id && row.permission_id == permission_id));
        Ok(rows.len() != before)
    }
}

#[async_trait]
impl AuditRepository for InMemoryBackend {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_events.lock().await.push(event);
        Ok(())
    }
}

#[async_trait]
impl EmailService for InMemoryBackend {
    async fn send_email(
        &self,
        to: &str,
        _subject: &str,
        text_body: &str,
        _html_body: Option<&str>,
    ) -> AppResult<()> {
        let faults = self.faults.lock().await.clone();
        if faults.panic_email_to.as_deref() == Some(to) {
            panic!("mail transport crashed");
        }
        if faults.slow_email_to.as_deref() == Some(to) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if faults.email_to.as_deref() == Some(to) {
            return Err(AppError::Internal(format!("mailbox '{to}' rejected the message")));
        }

        self.sent_emails
            .lock()
            .await
            .push((to.to_owned(), text_body.to_owned()));
        Ok(())
    }
}

/// Hasher that prefixes instead of hashing.
pub(crate) struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(hash_for(password))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == hash_for(password))
    }
}

/// All services wired against one in-memory backend.
pub(crate) struct Harness {
    pub backend: Arc<InMemoryBackend>,
    pub invitations: InvitationService,
    pub provisioning: ProvisioningService,
    pub authorization: AuthorizationService,
    pub sessions: SessionService,
    pub admin: UserAdminService,
}

impl Harness {
    pub(crate) async fn new() -> Self {
        Self::with_settings(InvitationSettings::new("https://fees.example.edu/")).await
    }

    pub(crate) async fn with_settings(settings: InvitationSettings) -> Self {
        let backend = InMemoryBackend::seeded().await;
        let invitations = InvitationService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend.clone(),
            settings,
        );
        let provisioning = ProvisioningService::new(
            invitations.clone(),
            backend.clone(),
            backend.clone(),
            Arc::new(PlainHasher),
            backend.clone(),
        )
        .with_bootstrap_token("bootstrap-secret");
        let authorization = AuthorizationService::new(backend.clone(), backend.clone());
        let sessions = SessionService::new(
            backend.clone(),
            backend.clone(),
            Arc::new(PlainHasher),
            authorization.clone(),
            backend.clone(),
        );
        let admin = UserAdminService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend.clone(),
        );

        Self {
            backend,
            invitations,
            provisioning,
            authorization,
            sessions,
            admin,
        }
    }

    /// Resolves a user, failing the test on error.
    pub(crate) async fn resolve(&self, user_id: UserId) -> EffectiveUser {
        self.authorization
            .resolve(user_id)
            .await
            .unwrap_or_else(|error| panic!("resolve failed: {error}"))
    }
}

/// Collects capability names for compact assertions.
pub(crate) fn capability_names(user: &EffectiveUser) -> BTreeSet<&'static str> {
    user.permissions()
        .iter()
        .map(|capability| capability.as_str())
        .collect()
}
