//! MySQL repository implementations

mod token_repository_impl;
mod user_repository_impl;

pub use token_repository_impl::MySqlTokenRepository;
pub use user_repository_impl::MySqlUserRepository;

use cs_core::errors::DomainError;
use uuid::Uuid;

/// Wrap a SQLx failure with the operation that hit it
fn query_failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| DomainError::internal(format!("Failed to {}: {}", operation, e))
}

fn parse_uuid(column: &str, raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw)
        .map_err(|e| DomainError::internal(format!("Invalid UUID in {}: {}", column, e)))
}
