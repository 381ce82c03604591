//! Verified caller identity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::user::Role;

/// The caller behind a verified access token.
///
/// Only the token service constructs identities, so holding one proves the
/// access token was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: Uuid,
    role: Role,
    token_id: String,
    expires_at: DateTime<Utc>,
}

impl Identity {
    pub(crate) fn new(user_id: Uuid, role: Role, token_id: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            role,
            token_id,
            expires_at,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// `jti` of the access token
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
