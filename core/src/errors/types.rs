//! Error types for authentication and token management.
//!
//! Messages are deliberately generic; the presentation layer decides what is
//! shown to clients.

use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user or wrong password; the two are never distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No usable bearer credential was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated, but the role does not satisfy the requirement
    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Account suspended")]
    AccountSuspended,

    #[error("User already exists")]
    UserAlreadyExists,
}

/// Token verification and lifecycle errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Unparseable or carrying a bad signature
    #[error("Malformed token")]
    Malformed,

    #[error("Token expired")]
    Expired,

    /// Well-formed and signed, but of the wrong type, issuer, audience or not yet valid
    #[error("Invalid token")]
    Invalid,

    #[error("Token revoked")]
    Revoked,

    /// No stored record backs the presented refresh token
    #[error("Token not found")]
    NotFound,

    #[error("Token generation failed")]
    GenerationFailed,
}

impl TokenError {
    /// Stable name reported to clients as the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed => "Malformed",
            TokenError::Expired => "Expired",
            TokenError::Invalid => "Invalid",
            TokenError::Revoked => "Revoked",
            TokenError::NotFound => "NotFound",
            TokenError::GenerationFailed => "GenerationFailed",
        }
    }
}
