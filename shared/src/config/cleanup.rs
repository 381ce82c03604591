//! Refresh token cleanup scheduling

use serde::{Deserialize, Serialize};

use super::EnvReader;

/// Configuration for the expired refresh-token sweep
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Whether the recurring sweep runs
    pub enabled: bool,

    /// How often to sweep, in seconds
    pub interval_seconds: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 3600,
        }
    }
}

impl CleanupConfig {
    pub fn load(env: &mut EnvReader) -> Self {
        let defaults = Self::default();
        let config = Self {
            enabled: env.flag("TOKEN_CLEANUP_ENABLED", defaults.enabled),
            interval_seconds: env.parse("TOKEN_CLEANUP_INTERVAL_SECONDS", defaults.interval_seconds),
        };
        if config.interval_seconds == 0 {
            env.record("TOKEN_CLEANUP_INTERVAL_SECONDS", "must be greater than zero");
        }
        config
    }
}
