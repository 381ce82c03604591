//! # Infrastructure Layer
//!
//! Concrete implementations of the storage and delivery traits defined in
//! `cs_core`:
//! - **Database**: MySQL credential and refresh-token stores using SQLx
//! - **Memory**: process-local stores for development and tests
//! - **Rate limit**: in-memory and Redis counter stores
//! - **Email**: Resend HTTP API and log-only notifiers
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable the Redis counter store (default)

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Email delivery for account notifications
pub mod email;

/// Process-local credential and refresh-token stores
pub mod memory;

/// Counter stores behind the rate limiter
pub mod rate_limit;

pub use email::{create_notifier, LoggingNotifier, ResendNotifier};
pub use memory::{InMemoryTokenRepository, InMemoryUserRepository};
pub use rate_limit::InMemoryRateLimitStore;

#[cfg(feature = "redis-cache")]
pub use rate_limit::RedisRateLimitStore;

use cs_core::errors::DomainError;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[cfg(feature = "mysql")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[cfg(feature = "redis-cache")]
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Email provider rejected a message
    #[error("Email delivery error: {0}")]
    Email(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::internal(err.to_string())
    }
}
