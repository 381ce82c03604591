//! Authentication configuration

use serde::{Deserialize, Serialize};

use super::EnvReader;

/// Minimum length accepted for either signing secret
pub const MIN_SECRET_LENGTH: usize = 10;

/// Token signing, lifetime and password hashing settings
#[derive(Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HMAC secret for access and password-reset tokens
    pub access_secret: String,

    /// HMAC secret for refresh tokens
    pub refresh_secret: String,

    /// Access token lifetime in seconds
    pub access_token_ttl_seconds: i64,

    /// Refresh token lifetime in days
    pub refresh_token_ttl_days: i64,

    /// Password reset token lifetime in minutes
    pub password_reset_ttl_minutes: i64,

    /// JWT issuer claim
    pub issuer: String,

    /// JWT audience claim
    pub audience: String,

    /// Clock skew tolerated when checking `exp`/`nbf`, in seconds
    #[serde(default)]
    pub leeway_seconds: u64,

    /// bcrypt work factor
    pub bcrypt_cost: u32,

    /// Deadline for a single credential or token store call, in milliseconds
    pub store_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: String::from("development-access-secret"),
            refresh_secret: String::from("development-refresh-secret"),
            access_token_ttl_seconds: 900,
            refresh_token_ttl_days: 7,
            password_reset_ttl_minutes: 30,
            issuer: String::from("content-scraper"),
            audience: String::from("content-scraper-api"),
            leeway_seconds: 0,
            bcrypt_cost: 12,
            store_timeout_ms: 2000,
        }
    }
}

impl AuthConfig {
    pub fn load(env: &mut EnvReader) -> Self {
        let defaults = Self::default();
        let access_secret = env.required("JWT_ACCESS_SECRET", MIN_SECRET_LENGTH);
        let refresh_secret = env.required("JWT_REFRESH_SECRET", MIN_SECRET_LENGTH);
        if !access_secret.is_empty() && access_secret == refresh_secret {
            env.record("JWT_REFRESH_SECRET", "must differ from JWT_ACCESS_SECRET");
        }

        let config = Self {
            access_secret,
            refresh_secret,
            access_token_ttl_seconds: env.parse("JWT_ACCESS_TTL_SECONDS", defaults.access_token_ttl_seconds),
            refresh_token_ttl_days: env.parse("JWT_REFRESH_TTL_DAYS", defaults.refresh_token_ttl_days),
            password_reset_ttl_minutes: env.parse(
                "PASSWORD_RESET_TTL_MINUTES",
                defaults.password_reset_ttl_minutes,
            ),
            issuer: env.string("JWT_ISSUER", &defaults.issuer),
            audience: env.string("JWT_AUDIENCE", &defaults.audience),
            leeway_seconds: env.parse("JWT_LEEWAY_SECONDS", defaults.leeway_seconds),
            bcrypt_cost: env.parse("BCRYPT_COST", defaults.bcrypt_cost),
            store_timeout_ms: env.parse("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
        };

        if config.access_token_ttl_seconds <= 0 {
            env.record("JWT_ACCESS_TTL_SECONDS", "must be positive");
        }
        if config.refresh_token_ttl_days <= 0 {
            env.record("JWT_REFRESH_TTL_DAYS", "must be positive");
        }
        if !(4..=31).contains(&config.bcrypt_cost) {
            env.record("BCRYPT_COST", "must be between 4 and 31");
        }
        config
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_days * 86_400
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .field("password_reset_ttl_minutes", &self.password_reset_ttl_minutes)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .finish()
    }
}
