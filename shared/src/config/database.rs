//! Database configuration module

use serde::{Deserialize, Serialize};

use super::EnvReader;

/// Where user and refresh-token records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; data is lost on restart
    Memory,
    /// MySQL through a SQLx pool
    MySql,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "mysql" => Ok(StorageBackend::MySql),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

/// Database configuration for MySQL connections
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Selected storage backend
    pub backend: StorageBackend,

    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    pub connect_timeout: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            url: String::new(),
            max_connections: 10,
            connect_timeout: 5,
            idle_timeout: 600,
        }
    }
}

impl DatabaseConfig {
    pub fn load(env: &mut EnvReader) -> Self {
        let defaults = Self::default();
        let backend = match env.optional("STORAGE_BACKEND").map(|raw| raw.parse()) {
            None => defaults.backend,
            Some(Ok(backend)) => backend,
            Some(Err(message)) => {
                env.record("STORAGE_BACKEND", message);
                defaults.backend
            }
        };

        let url = match backend {
            StorageBackend::MySql => {
                let url = env.required("DATABASE_URL", 1);
                if !url.is_empty() && !url.starts_with("mysql://") {
                    env.record("DATABASE_URL", "must be a mysql:// URL");
                }
                url
            }
            StorageBackend::Memory => env.string("DATABASE_URL", ""),
        };

        Self {
            backend,
            url,
            max_connections: env.parse("DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            connect_timeout: env.parse("DATABASE_CONNECT_TIMEOUT", defaults.connect_timeout),
            idle_timeout: env.parse("DATABASE_IDLE_TIMEOUT", defaults.idle_timeout),
        }
    }

    /// Create a MySQL configuration with URL
    pub fn mysql(url: impl Into<String>) -> Self {
        Self {
            backend: StorageBackend::MySql,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}
