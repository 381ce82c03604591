//! Cache configuration module

use serde::{Deserialize, Serialize};

use super::EnvReader;

/// Redis configuration, used when rate-limit counters are shared across instances
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection timeout in seconds
    pub connection_timeout: u64,

    /// Prefix prepended to every key written by this service
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://localhost:6379"),
            connection_timeout: 5,
            key_prefix: String::from("content-scraper"),
        }
    }
}

impl CacheConfig {
    pub fn load(env: &mut EnvReader) -> Self {
        let defaults = Self::default();
        let url = env.string("REDIS_URL", &defaults.url);
        if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
            env.record("REDIS_URL", "must be a redis:// or rediss:// URL");
        }
        Self {
            url,
            connection_timeout: env.parse("REDIS_CONNECT_TIMEOUT", defaults.connection_timeout),
            key_prefix: env.string("REDIS_KEY_PREFIX", &defaults.key_prefix),
        }
    }

    /// Prefix a key with the configured namespace
    pub fn namespaced(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }
}
