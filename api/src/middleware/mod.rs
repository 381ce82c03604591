//! Request pipeline and the stages it is built from

pub mod auth;
pub mod client_ip;
pub mod pipeline;
pub mod rate_limit;

pub use auth::{AuthContext, AuthenticateStage, AuthorizeStage};
pub use pipeline::{Pipeline, Stage};
pub use rate_limit::RateLimitStage;
