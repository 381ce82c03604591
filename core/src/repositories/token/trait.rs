//! Token repository trait defining the interface for refresh token persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainError;

/// Repository trait for RefreshToken record persistence
///
/// Records are keyed by their id, which is also the `jti` of the signed value
/// handed to the client. Implementations must make [`rotate`](Self::rotate)
/// atomic: of two concurrent rotations of the same record exactly one may
/// return `true`.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a new record
    ///
    /// # Returns
    /// * `Ok(())` - Record stored
    /// * `Err(DomainError)` - Storage failure or duplicate id
    async fn insert(&self, token: &RefreshToken) -> Result<(), DomainError>;

    /// Find a record by its id
    ///
    /// # Returns
    /// * `Ok(Some(RefreshToken))` - Record found, whatever its state
    /// * `Ok(None)` - No record with this id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshToken>, DomainError>;

    /// Revoke a single record
    ///
    /// # Returns
    /// * `Ok(true)` - Record was active and is now revoked
    /// * `Ok(false)` - Record unknown or already revoked
    async fn revoke(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Atomically revoke `old_id` (recording `replacement.id` as its successor)
    /// and insert `replacement`
    ///
    /// # Returns
    /// * `Ok(true)` - Rotation committed
    /// * `Ok(false)` - `old_id` was unknown or already revoked; nothing was written
    async fn rotate(&self, old_id: Uuid, replacement: &RefreshToken) -> Result<bool, DomainError>;

    /// Revoke every active record of a rotation family, returning how many changed
    async fn revoke_family(&self, family_id: Uuid) -> Result<usize, DomainError>;

    /// Revoke every active record of a user, returning how many changed
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize, DomainError>;

    /// Delete records with `expires_at < before`, returning how many were removed
    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<usize, DomainError>;
}
