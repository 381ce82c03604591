//! Repository interfaces for the credential store, the refresh token store
//! and the rate-limit counter store.

pub mod rate_limit;
pub mod token;
pub mod user;

pub use rate_limit::{RateLimitStore, WindowState};
pub use token::TokenRepository;
pub use user::UserRepository;

#[cfg(test)]
pub use rate_limit::MockRateLimitStore;
#[cfg(test)]
pub use token::MockTokenRepository;
#[cfg(test)]
pub use user::MockUserRepository;
