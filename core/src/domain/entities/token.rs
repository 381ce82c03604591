//! Token entities for JWT-based authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Role;

/// Token type reported to clients alongside an access token
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Discriminates the purpose of a signed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
    PasswordReset,
}

/// Claims structure for access token payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Role at the time of issuance
    pub role: Role,

    /// Issued at timestamp
    pub iat: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID (unique identifier for the token)
    pub jti: String,

    pub typ: TokenType,
}

impl Claims {
    /// Creates new claims for an access token
    pub fn new_access_token(
        user_id: Uuid,
        role: Role,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
            typ: TokenType::Access,
        }
    }

    /// Gets the user ID from the claims
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Claims carried by the client-facing refresh token value.
///
/// `jti` is the id of the stored [`RefreshToken`] record, `fam` its rotation family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub fam: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub typ: TokenType,
}

impl RefreshClaims {
    pub fn for_record(record: &RefreshToken, issuer: &str) -> Self {
        Self {
            sub: record.user_id.to_string(),
            jti: record.id.to_string(),
            fam: record.family_id.to_string(),
            iat: record.created_at.timestamp(),
            exp: record.expires_at.timestamp(),
            iss: issuer.to_string(),
            typ: TokenType::Refresh,
        }
    }
}

/// Claims of a password reset token.
///
/// `ver` pins the token to the password that was current when it was issued,
/// so a completed reset invalidates every outstanding reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetClaims {
    pub sub: String,
    pub ver: i64,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub typ: TokenType,
}

impl PasswordResetClaims {
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Refresh token record stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Record id, also the `jti` of the client-facing value
    pub id: Uuid,

    /// Owner of the token
    pub user_id: Uuid,

    /// Rotation chain this token belongs to
    pub family_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    pub is_revoked: bool,

    pub revoked_at: Option<DateTime<Utc>>,

    /// Record that replaced this one during rotation
    pub replaced_by: Option<Uuid>,
}

impl RefreshToken {
    /// Creates a new record that expires `ttl` from now
    pub fn new(user_id: Uuid, family_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            family_id,
            created_at: now,
            expires_at: now + ttl,
            is_revoked: false,
            revoked_at: None,
            replaced_by: None,
        }
    }

    /// Starts a new rotation family
    pub fn new_family(user_id: Uuid, ttl: Duration) -> Self {
        Self::new(user_id, Uuid::new_v4(), ttl)
    }

    /// The record that replaces this one on rotation
    pub fn successor(&self, ttl: Duration) -> Self {
        Self::new(self.user_id, self.family_id, ttl)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Neither revoked nor expired
    pub fn is_valid(&self) -> bool {
        !self.is_revoked && !self.is_expired()
    }

    /// Whether the record was consumed by a rotation rather than a logout
    pub fn was_rotated(&self) -> bool {
        self.is_revoked && self.replaced_by.is_some()
    }

    pub fn revoke(&mut self) {
        if !self.is_revoked {
            self.is_revoked = true;
            self.revoked_at = Some(Utc::now());
        }
    }

    /// Marks the record as consumed by `replacement`
    pub fn rotate_to(&mut self, replacement: Uuid) {
        self.revoke();
        self.replaced_by = Some(replacement);
    }
}

/// Access and refresh token pair handed to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        refresh_expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in,
            refresh_expires_at,
        }
    }
}
