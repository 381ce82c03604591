//! Token service module for JWT management
//!
//! This module handles all token-related operations including:
//! - JWT access token generation and verification
//! - Refresh token rotation with reuse detection
//! - Token revocation
//! - Password reset tokens
//! - Background cleanup of expired tokens

mod cleanup;
mod config;
mod service;

#[cfg(test)]
mod tests;

pub use cleanup::TokenCleanupService;
pub use config::TokenServiceConfig;
pub use service::TokenService;
