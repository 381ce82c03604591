//! Domain entities representing core business objects.

pub mod identity;
pub mod rate_limit;
pub mod token;
pub mod user;


// Re-export commonly used types
pub use identity::Identity;
pub use rate_limit::{ClientKey, EndpointClass, RateLimitTicket, UNIDENTIFIED_CLIENT};
pub use token::{
    Claims, PasswordResetClaims, RefreshClaims, RefreshToken, TokenPair, TokenType,
    TOKEN_TYPE_BEARER,
};
pub use user::{AccountStatus, Role, User};
