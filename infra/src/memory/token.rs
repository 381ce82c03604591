use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use cs_core::domain::entities::RefreshToken;
use cs_core::errors::DomainError;
use cs_core::repositories::TokenRepository;

/// Refresh token store held in memory
///
/// Every mutation takes the write lock for its whole check-then-write, which
/// makes [`rotate`](TokenRepository::rotate) atomic.
#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<Uuid, RefreshToken>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, revoked ones included
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }

    fn revoke_where<F>(tokens: &mut HashMap<Uuid, RefreshToken>, predicate: F) -> usize
    where
        F: Fn(&RefreshToken) -> bool,
    {
        tokens
            .values_mut()
            .filter(|t| !t.is_revoked && predicate(&**t))
            .map(RefreshToken::revoke)
            .count()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> Result<(), DomainError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.id) {
            return Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            });
        }
        tokens.insert(token.id, token.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshToken>, DomainError> {
        Ok(self.tokens.read().await.get(&id).cloned())
    }

    async fn revoke(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(&id) {
            Some(token) if !token.is_revoked => {
                token.revoke();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn rotate(&self, old_id: Uuid, replacement: &RefreshToken) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&replacement.id) {
            return Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            });
        }
        match tokens.get_mut(&old_id) {
            Some(old) if !old.is_revoked => old.rotate_to(replacement.id),
            _ => return Ok(false),
        }
        tokens.insert(replacement.id, replacement.clone());
        Ok(true)
    }

    async fn revoke_family(&self, family_id: Uuid) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;
        Ok(Self::revoke_where(&mut tokens, |t| t.family_id == family_id))
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;
        Ok(Self::revoke_where(&mut tokens, |t| t.user_id == user_id))
    }

    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;
        let initial = tokens.len();
        tokens.retain(|_, token| token.expires_at >= before);
        Ok(initial - tokens.len())
    }
}
