//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - Token signing, lifetimes and password hashing
//! - `cache` - Redis connection used for shared rate-limit counters
//! - `cleanup` - Expired refresh-token sweep scheduling
//! - `database` - Storage backend selection and MySQL pool settings
//! - `email` - Outbound notification provider
//! - `environment` - Deployment mode and logging configuration
//! - `rate_limit` - Per endpoint-class request quotas
//! - `server` - HTTP server binding and routing prefix
//!
//! Every section can be read from the process environment through [`EnvReader`],
//! which collects all invalid or missing fields before failing so the operator
//! sees the complete list at once.

pub mod auth;
pub mod cache;
pub mod cleanup;
pub mod database;
pub mod email;
pub mod environment;
pub mod rate_limit;
pub mod server;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::validation::validators;

// Re-export commonly used types
pub use auth::AuthConfig;
pub use cache::CacheConfig;
pub use cleanup::CleanupConfig;
pub use database::{DatabaseConfig, StorageBackend};
pub use email::{EmailConfig, EmailProvider};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use rate_limit::{EndpointLimit, RateLimitBackend, RateLimitConfig};
pub use server::ServerConfig;

/// Configuration loading failure with every offending field
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid or missing environment variables: {}", format_field_errors(.0))]
    Invalid(BTreeMap<String, Vec<String>>),
}

impl ConfigError {
    /// Field name to messages, sorted by field
    pub fn field_errors(&self) -> &BTreeMap<String, Vec<String>> {
        match self {
            ConfigError::Invalid(errors) => errors,
        }
    }
}

fn format_field_errors(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reads typed values from an environment source and records every failure.
pub struct EnvReader {
    source: HashMap<String, String>,
    errors: BTreeMap<String, Vec<String>>,
}

impl EnvReader {
    /// Snapshot of the current process environment
    pub fn from_process() -> Self {
        Self::from_map(std::env::vars().collect())
    }

    /// Reader over an explicit set of variables
    pub fn from_map(source: HashMap<String, String>) -> Self {
        Self {
            source,
            errors: BTreeMap::new(),
        }
    }

    /// Raw value, treating empty strings as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.source
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First present value among `keys`
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub fn optional(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// Required value of at least `min_len` characters
    pub fn required(&mut self, key: &str, min_len: usize) -> String {
        match self.get(key).map(str::to_string) {
            Some(value) if value.chars().count() >= min_len => value,
            Some(_) => {
                self.record(key, format!("must be at least {} characters", min_len));
                String::new()
            }
            None => {
                self.record(key, "is required");
                String::new()
            }
        }
    }

    /// Parsed value, falling back to `default` when unset
    pub fn parse<T>(&mut self, key: &str, default: T) -> T
    where
        T: FromStr,
    {
        let Some(raw) = self.get(key).map(str::to_string) else {
            return default;
        };
        match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                self.record(key, format!("cannot parse '{}'", raw));
                default
            }
        }
    }

    /// Boolean flag accepting true/false/1/0/yes/no
    pub fn flag(&mut self, key: &str, default: bool) -> bool {
        let Some(raw) = self.get(key).map(str::to_lowercase) else {
            return default;
        };
        match raw.as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => {
                self.record(key, format!("expected a boolean, got '{}'", raw));
                default
            }
        }
    }

    /// URL-shaped value, falling back to `default` when unset
    pub fn url(&mut self, key: &str, default: &str) -> String {
        let value = self.string(key, default);
        if !validators::is_url(&value) {
            self.record(key, "must be a valid URL");
        }
        value
    }

    /// Email-shaped value, falling back to `default` when unset
    pub fn email(&mut self, key: &str, default: &str) -> String {
        let value = self.string(key, default);
        if !validators::is_email(&value) {
            self.record(key, "must be a valid email address");
        }
        value
    }

    pub fn record(&mut self, key: &str, message: impl Into<String>) {
        self.errors
            .entry(key.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume the reader, failing if any field was invalid
    pub fn finish(self) -> Result<(), ConfigError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self.errors))
        }
    }
}

impl fmt::Debug for EnvReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may hold secrets; only the error map is printed.
        f.debug_struct("EnvReader")
            .field("errors", &self.errors)
            .finish()
    }
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub cleanup: CleanupConfig,
    pub email: EmailConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let environment = Environment::default();
        Self {
            environment,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cleanup: CleanupConfig::default(),
            email: EmailConfig::default(),
            logging: LoggingConfig::for_environment(environment),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(EnvReader::from_process())
    }

    /// Load and validate configuration from an explicit reader
    pub fn from_reader(mut env: EnvReader) -> Result<Self, ConfigError> {
        let environment = Environment::load(&mut env);
        let config = Self {
            environment,
            server: ServerConfig::load(&mut env),
            database: DatabaseConfig::load(&mut env),
            cache: CacheConfig::load(&mut env),
            auth: AuthConfig::load(&mut env),
            rate_limit: RateLimitConfig::load(&mut env),
            cleanup: CleanupConfig::load(&mut env),
            email: EmailConfig::load(&mut env),
            logging: LoggingConfig::load(&mut env, environment),
        };
        env.finish()?;
        Ok(config)
    }

    /// Whether development-only surfaces (admin maintenance routes) may be exposed
    pub fn exposes_admin_routes(&self) -> bool {
        !self.environment.is_production()
    }
}
