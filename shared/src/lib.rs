//! Shared utilities and common types for the content scraper server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types and environment validation
//! - Error response structures
//! - Validation helpers

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CacheConfig, CleanupConfig, ConfigError, DatabaseConfig,
    EmailConfig, EndpointLimit, Environment, LoggingConfig, RateLimitConfig, ServerConfig,
};
pub use errors::{error_codes, ErrorResponse};
pub use utils::validation;
