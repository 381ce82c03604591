//! Business services containing domain logic and use cases.

pub mod auth;
pub mod authorization;
pub mod deadline;
pub mod notification;
pub mod rate_limit;
pub mod token;

// Re-export commonly used types
pub use auth::{AuthService, AuthServiceConfig, PasswordHasher, RegisterCommand};
pub use authorization::{AuthorizationGate, RoleHierarchy};
pub use notification::{dispatch, Notification, Notifier};
pub use rate_limit::RateLimiter;
pub use token::{TokenCleanupService, TokenService, TokenServiceConfig};
