//! # Content Scraper API
//!
//! HTTP surface of the authentication gateway: the actix-web application
//! factory, the request pipeline (rate limiting, authentication and
//! authorization stages), route handlers and error mapping.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod state;

pub use app::create_app;
pub use state::AppState;
