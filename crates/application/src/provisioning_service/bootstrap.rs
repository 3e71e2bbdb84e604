use super::*;

/// Input for creating the first admin account.
#[derive(Clone)]
pub struct BootstrapAdminRequest {
    /// Shared secret from `AUTH_BOOTSTRAP_TOKEN`.
    pub token: String,
    /// Admin email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Display name.
    pub name: String,
    /// Staff employee id.
    pub employee_id: String,
}

impl std::fmt::Debug for BootstrapAdminRequest {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BootstrapAdminRequest")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("employee_id", &self.employee_id)
            .finish_non_exhaustive()
    }
}

impl ProvisioningService {
    /// Creates the very first admin account.
    ///
    /// Requires the configured bootstrap token and fails once any active
    /// admin exists.
    pub async fn bootstrap_admin(
        &self,
        request: BootstrapAdminRequest,
    ) -> AppResult<ProvisionedAccount> {
        let Some(expected) = self.bootstrap_token.as_deref() else {
            return Err(AppError::Forbidden("bootstrap is disabled".to_owned()));
        };
        if request.token != expected {
            return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()));
        }

        if self.profile_repository.admin_exists().await? {
            return Err(AppError::Conflict(
                "an admin account already exists".to_owned(),
            ));
        }

        let email = EmailAddress::new(&request.email)?;
        let name = NonEmptyString::new(request.name)?;
        validate_password(&request.password)?;
        let identifiers = resolve_profile_identifiers(
            Role::Admin,
            &ProfileIdentifiers::default(),
            &ProfileIdentifiers {
                roll_number: None,
                employee_id: Some(request.employee_id),
            },
        )?;

        if self
            .identity_repository
            .find_by_email(email.as_str())
            .await?
            .is_some()
        {
            return Err(AccountError::DuplicateAccount.into());
        }

        let password_hash = self.password_hasher.hash_password(&request.password)?;
        let identity_id = self
            .identity_repository
            .create_identity(email.as_str(), &password_hash)
            .await?;

        let profile = NewProfile {
            id: identity_id,
            name: name.into(),
            email: email.as_str().to_owned(),
            role: Role::Admin,
            department_id: None,
            roll_number: None,
            employee_id: identifiers.employee_id,
        };
        if let Err(error) = self.profile_repository.create_profile(profile).await {
            tracing::warn!(
                subject = %identity_id,
                %error,
                "admin profile write failed, removing identity"
            );
            self.roll_back(identity_id, false).await;
            return Err(AccountError::ProvisionPartialFailure(
                "the admin profile could not be saved".to_owned(),
            )
            .into());
        }

        self.audit(identity_id, AuditAction::AccountBootstrapped, None)
            .await;
        tracing::info!(subject = %identity_id, "bootstrap admin created");

        Ok(ProvisionedAccount {
            identity_id,
            role: Role::Admin,
            department_id: None,
        })
    }
}
