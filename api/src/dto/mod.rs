//! Request and response bodies of the HTTP API

pub mod auth;
pub mod user;

pub use auth::{
    ForgotPasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
    ResetPasswordRequest, TokenResponse,
};
pub use user::UserResponse;
