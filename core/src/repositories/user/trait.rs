//! User repository trait defining the interface for the credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::errors::DomainError;
use crate::services::auth::PasswordHasher;

/// Repository trait for User entity persistence operations
///
/// Implementations handle the actual storage; lookups return `Ok(None)` for
/// unknown users and reserve `Err` for storage failures.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Find a user by username (exact match)
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by email address (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Persist a new user
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(DomainError::Auth(AuthError::UserAlreadyExists))` - Username or email taken
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Replace a user's password hash, provided it was last changed at
    /// `expected_changed_at`.
    ///
    /// The comparison and the write are one atomic step, so of two updates
    /// made against the same password version only one succeeds.
    ///
    /// # Returns
    /// * `Ok(true)` - Password updated
    /// * `Ok(false)` - No such user, or the password changed in the meantime
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
        expected_changed_at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Find the user whose username and password both match.
    ///
    /// The bcrypt comparison runs even when the username is unknown so the
    /// two failure cases take the same time. Callers that put a deadline on
    /// storage calls should bound only the lookup, not this whole method.
    async fn find_by_credentials(
        &self,
        username: &str,
        password: &str,
        hasher: &PasswordHasher,
    ) -> Result<Option<User>, DomainError> {
        let user = self.find_by_username(username).await?;
        let hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = hasher.verify(password, hash).await?;
        Ok(user.filter(|_| matches))
    }
}
