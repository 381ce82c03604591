//! Mock implementation of TokenRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainError;

use super::r#trait::TokenRepository;

/// Mock token repository for testing, with failure and latency injection
#[derive(Default)]
pub struct MockTokenRepository {
    tokens: Arc<RwLock<HashMap<Uuid, RefreshToken>>>,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl MockTokenRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a storage error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent call
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn get(&self, id: Uuid) -> Option<RefreshToken> {
        self.tokens.read().await.get(&id).cloned()
    }

    pub async fn all(&self) -> Vec<RefreshToken> {
        self.tokens.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Insert a record as-is, bypassing injected failures
    pub async fn seed(&self, token: RefreshToken) {
        self.tokens.write().await.insert(token.id, token);
    }

    async fn simulate(&self) -> Result<(), DomainError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::internal("simulated storage failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenRepository for MockTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> Result<(), DomainError> {
        self.simulate().await?;
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
        self.simulate().await?;
        Ok(self.tokens.read().await.get(&id).cloned())
    }

    async fn revoke(&self, id: Uuid) -> Result<bool, DomainError> {
        self.simulate().await?;
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
        self.simulate().await?;
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(&old_id) {
            Some(old) if !old.is_revoked => old.rotate_to(replacement.id),
            _ => return Ok(false),
        }
        tokens.insert(replacement.id, replacement.clone());
        Ok(true)
    }

    async fn revoke_family(&self, family_id: Uuid) -> Result<usize, DomainError> {
        self.simulate().await?;
        let mut tokens = self.tokens.write().await;
        let mut count = 0;
        for token in tokens.values_mut() {
            if token.family_id == family_id && !token.is_revoked {
                token.revoke();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize, DomainError> {
        self.simulate().await?;
        let mut tokens = self.tokens.write().await;
        let mut count = 0;
        for token in tokens.values_mut() {
            if token.user_id == user_id && !token.is_revoked {
                token.revoke();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<usize, DomainError> {
        self.simulate().await?;
        let mut tokens = self.tokens.write().await;
        let initial = tokens.len();
        tokens.retain(|_, token| token.expires_at >= before);
        Ok(initial - tokens.len())
    }
}
