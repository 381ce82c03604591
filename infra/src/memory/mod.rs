//! Process-local stores backed by `tokio::sync::RwLock` maps.
//!
//! Used when `STORAGE_BACKEND=memory` and by the API integration tests. State
//! lives only as long as the process.

mod token;
mod user;

pub use token::InMemoryTokenRepository;
pub use user::InMemoryUserRepository;
