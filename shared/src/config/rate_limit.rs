//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

use super::EnvReader;

/// Where rate-limit counters are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Per-process counters; limits apply to each instance separately
    Memory,
    /// Counters shared by every instance through Redis
    Redis,
}

impl std::str::FromStr for RateLimitBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(RateLimitBackend::Memory),
            "redis" => Ok(RateLimitBackend::Redis),
            _ => Err(format!("Invalid rate limit backend: {}", s)),
        }
    }
}

/// Quota for one endpoint class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointLimit {
    /// Window length in seconds
    pub window_seconds: u64,

    /// Requests admitted per window
    pub max_requests: u32,

    /// Give the slot back when the request completes with a 2xx status
    #[serde(default)]
    pub skip_successful_requests: bool,
}

impl EndpointLimit {
    pub const fn new(window_seconds: u64, max_requests: u32) -> Self {
        Self {
            window_seconds,
            max_requests,
            skip_successful_requests: false,
        }
    }

    pub const fn skipping_successful(mut self) -> Self {
        self.skip_successful_requests = true;
        self
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Counter backend
    pub backend: RateLimitBackend,

    /// Use X-Forwarded-For / X-Real-IP instead of the socket address
    #[serde(default)]
    pub trust_proxy_headers: bool,

    /// How often idle in-memory windows are purged, in seconds
    #[serde(default = "default_purge_interval")]
    pub purge_interval_seconds: u64,

    /// Every API route
    pub general: EndpointLimit,

    /// Login attempts
    pub login: EndpointLimit,

    /// Account creation
    pub registration: EndpointLimit,

    /// Password reset requests and confirmations
    pub password_reset: EndpointLimit,

    /// Endpoints that send an email
    pub email_send: EndpointLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: RateLimitBackend::Memory,
            trust_proxy_headers: false,
            purge_interval_seconds: default_purge_interval(),
            general: EndpointLimit::new(15 * 60, 100),
            login: EndpointLimit::new(15 * 60, 5).skipping_successful(),
            registration: EndpointLimit::new(60 * 60, 3),
            password_reset: EndpointLimit::new(60 * 60, 3),
            email_send: EndpointLimit::new(60 * 60, 5),
        }
    }
}

impl RateLimitConfig {
    pub fn load(env: &mut EnvReader) -> Self {
        let defaults = Self::default();
        let backend = match env.optional("RATE_LIMIT_BACKEND").map(|raw| raw.parse()) {
            None => defaults.backend,
            Some(Ok(backend)) => backend,
            Some(Err(message)) => {
                env.record("RATE_LIMIT_BACKEND", message);
                defaults.backend
            }
        };

        Self {
            enabled: env.flag("RATE_LIMIT_ENABLED", defaults.enabled),
            backend,
            trust_proxy_headers: env.flag("RATE_LIMIT_TRUST_PROXY", defaults.trust_proxy_headers),
            purge_interval_seconds: env.parse(
                "RATE_LIMIT_PURGE_INTERVAL_SECONDS",
                defaults.purge_interval_seconds,
            ),
            ..defaults
        }
    }

    /// Disable every limit, for local tooling
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_purge_interval() -> u64 {
    60
}
