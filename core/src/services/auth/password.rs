//! bcrypt password hashing off the async runtime

use tracing::warn;

use crate::errors::DomainError;

/// Hashes and verifies passwords on the blocking thread pool.
///
/// Holds a hash of a throwaway password made with the same cost, verified
/// against when the user is unknown so both failure paths cost the same.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, DomainError> {
        let dummy_hash = bcrypt::hash("timing-equalisation-placeholder", cost)
            .map_err(|e| DomainError::internal(format!("invalid bcrypt cost: {}", e)))?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, password: &str) -> Result<String, DomainError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| DomainError::internal(format!("hashing task failed: {}", e)))?
            .map_err(|e| DomainError::internal(format!("hashing failed: {}", e)))
    }

    /// Compare `password` with `hash`, or with the placeholder when `hash` is `None`.
    ///
    /// A stored hash that bcrypt cannot parse counts as a mismatch.
    pub async fn verify(&self, password: &str, hash: Option<String>) -> Result<bool, DomainError> {
        let known = hash.is_some();
        let hash = hash.unwrap_or_else(|| self.dummy_hash.clone());
        let password = password.to_string();

        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| DomainError::internal(format!("verification task failed: {}", e)))?;

        match outcome {
            Ok(matches) => Ok(known && matches),
            Err(e) => {
                warn!(error = %e, "Stored password hash is unreadable");
                Ok(false)
            }
        }
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").field("cost", &self.cost).finish()
    }
}
