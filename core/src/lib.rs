//! # Content Scraper Core
//!
//! Authentication, session lifecycle and access-control logic for the content
//! scraper backend. This crate contains domain entities, repository interfaces,
//! the token, authorization, rate limiting and auth services, and the error
//! types that tie them together.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
