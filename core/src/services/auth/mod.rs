//! Authentication service module
//!
//! Login, registration, token refresh, logout and password reset, built on
//! the credential store, the token service and the notifier.

pub mod password;
mod service;


pub use password::PasswordHasher;
pub use service::{AuthService, AuthServiceConfig, RegisterCommand};
