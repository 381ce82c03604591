//! Configuration for the token service

use std::time::Duration as StdDuration;

use chrono::Duration;
use cs_shared::AuthConfig;

/// Configuration for the token service
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// Secret for access and password reset tokens
    pub access_secret: String,
    /// Secret for refresh token values
    pub refresh_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub password_reset_ttl: Duration,
    pub issuer: String,
    pub audience: String,
    /// Clock skew tolerated on `exp`/`nbf`, in seconds
    pub leeway_seconds: u64,
    /// Deadline for each token store call
    pub store_timeout: StdDuration,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for TokenServiceConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_token_ttl: Duration::seconds(config.access_token_ttl_seconds),
            refresh_token_ttl: Duration::days(config.refresh_token_ttl_days),
            password_reset_ttl: Duration::minutes(config.password_reset_ttl_minutes),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            leeway_seconds: config.leeway_seconds,
            store_timeout: StdDuration::from_millis(config.store_timeout_ms),
        }
    }
}

impl std::fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("password_reset_ttl", &self.password_reset_ttl)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}
