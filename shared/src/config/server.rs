//! Server configuration module

use serde::{Deserialize, Serialize};

use super::EnvReader;

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Application name used in logs and the endpoint index
    pub app_name: String,

    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Prefix for every versioned API route
    pub api_prefix: String,

    /// Public base URL of this service
    pub base_url: String,

    /// Worker threads (0 = number of CPU cores)
    #[serde(default)]
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("content-scraper"),
            host: String::from("0.0.0.0"),
            port: 4000,
            api_prefix: String::from("/api/v1"),
            base_url: String::from("http://localhost"),
            workers: 0,
        }
    }
}

impl ServerConfig {
    pub fn load(env: &mut EnvReader) -> Self {
        let defaults = Self::default();
        let api_prefix = env.string("API_PREFIX", &defaults.api_prefix);
        if !api_prefix.starts_with('/') {
            env.record("API_PREFIX", "must start with '/'");
        }
        Self {
            app_name: env.string("APP_NAME", &defaults.app_name),
            host: env.string("SERVER_HOST", &defaults.host),
            port: env.parse("PORT", defaults.port),
            api_prefix: api_prefix.trim_end_matches('/').to_string(),
            base_url: env.url("BASE_URL", &defaults.base_url),
            workers: env.parse("SERVER_WORKERS", defaults.workers),
        }
    }

    /// Get the bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
