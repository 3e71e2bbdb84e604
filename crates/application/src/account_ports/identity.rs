use async_trait::async_trait;

use feedesk_core::AppResult;
use feedesk_domain::UserId;

/// Authentication identity as stored by the identity store.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    /// Stable subject id.
    pub id: UserId,
    /// Canonical email address.
    pub email: String,
    /// Argon2id password hash.
    pub password_hash: String,
}

/// Repository port for authentication identities.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Finds an identity by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<IdentityRecord>>;

    /// Finds an identity by id.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<IdentityRecord>>;

    /// Creates an identity. Fails with `DuplicateAccount` when the email is taken.
    async fn create_identity(&self, email: &str, password_hash: &str) -> AppResult<UserId>;

    /// Deletes an identity together with its profile and role assignments.
    /// Deleting a missing identity is not an error.
    async fn delete_identity(&self, user_id: UserId) -> AppResult<()>;
}

/// Port for password hashing operations. Keeps domain/application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password using Argon2id.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    /// Must run in constant time regardless of validity.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}
