//! Main token service implementation

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::entities::token::{
    Claims, PasswordResetClaims, RefreshClaims, RefreshToken, TokenPair, TokenType,
};
use crate::domain::entities::{Identity, User};
use crate::errors::{DomainError, TokenError};
use crate::repositories::{TokenRepository, UserRepository};
use crate::services::deadline;

use super::config::TokenServiceConfig;

/// Service for minting, verifying, rotating and revoking tokens.
///
/// Access tokens are stateless HS256 JWTs. Refresh tokens are JWTs signed with
/// a separate secret whose `jti` points at a stored [`RefreshToken`] record;
/// the record decides whether the value is still usable.
pub struct TokenService<R: TokenRepository + ?Sized> {
    repository: Arc<R>,
    config: TokenServiceConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_validation: Validation,
    refresh_validation: Validation,
    reset_validation: Validation,
}

impl<R: TokenRepository + ?Sized> TokenService<R> {
    /// Creates a new token service instance
    pub fn new(repository: Arc<R>, config: TokenServiceConfig) -> Self {
        let mut access_validation = Validation::new(Algorithm::HS256);
        access_validation.set_issuer(&[config.issuer.as_str()]);
        access_validation.set_audience(&[config.audience.as_str()]);
        access_validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        access_validation.validate_exp = true;
        access_validation.validate_nbf = true;
        access_validation.leeway = config.leeway_seconds;

        let mut refresh_validation = Validation::new(Algorithm::HS256);
        refresh_validation.set_issuer(&[config.issuer.as_str()]);
        refresh_validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        refresh_validation.validate_aud = false;
        refresh_validation.leeway = config.leeway_seconds;

        let reset_validation = access_validation.clone();

        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            repository,
            config,
            access_validation,
            refresh_validation,
            reset_validation,
        }
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Issues a fresh token pair for `user`, starting a new rotation family
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - Access and refresh token; the refresh record is persisted
    /// * `Err(DomainError::Transient)` - The token store was unavailable
    pub async fn issue(&self, user: &User) -> Result<TokenPair, DomainError> {
        let record = RefreshToken::new_family(user.id, self.config.refresh_token_ttl);
        let pair = self.pair_for(user, &record)?;

        self.store("insert refresh token", self.repository.insert(&record))
            .await?;

        debug!(user_id = %user.id, token_id = %record.id, "Issued token pair");
        Ok(pair)
    }

    /// Verifies an access token and returns the caller's identity.
    ///
    /// Pure computation: no store access and no suspension.
    ///
    /// # Returns
    ///
    /// * `Ok(Identity)` - Signature, issuer, audience, lifetime and type all check out
    /// * `Err(TokenError::Malformed)` - Unparseable or bad signature
    /// * `Err(TokenError::Expired)` - Past `exp`
    /// * `Err(TokenError::Invalid)` - Wrong type, issuer, audience or not yet valid
    pub fn verify_access(&self, token: &str) -> Result<Identity, TokenError> {
        let claims = decode::<Claims>(token, &self.access_decoding, &self.access_validation)
            .map_err(|e| classify(&e))?
            .claims;

        if claims.typ != TokenType::Access {
            return Err(TokenError::Invalid);
        }

        let user_id = claims.user_id().map_err(|_| TokenError::Malformed)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(TokenError::Malformed)?;

        Ok(Identity::new(user_id, claims.role, claims.jti, expires_at))
    }

    /// Exchanges a refresh token for a new pair, rotating the stored record.
    ///
    /// The old record is revoked and its successor inserted in one store
    /// operation, so of two concurrent calls with the same value exactly one
    /// succeeds and the other observes `Revoked`. Presenting a value whose
    /// record was already rotated revokes the whole family.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - The rotated pair
    /// * `Err(TokenError::Expired)` - Value or record past its lifetime
    /// * `Err(TokenError::Revoked)` - Record revoked, reused, or owner no longer active
    /// * `Err(TokenError::NotFound)` - Value unparseable or no record behind it
    /// * `Err(DomainError::Transient)` - A store was unavailable
    pub async fn refresh<U>(&self, value: &str, users: &U) -> Result<TokenPair, DomainError>
    where
        U: UserRepository + ?Sized,
    {
        let claims = match decode::<RefreshClaims>(value, &self.refresh_decoding, &self.refresh_validation) {
            Ok(data) => data.claims,
            Err(e) if classify(&e) == TokenError::Expired => return Err(TokenError::Expired.into()),
            Err(e) => {
                debug!(error = %e, "Rejected unreadable refresh token");
                return Err(TokenError::NotFound.into());
            }
        };
        if claims.typ != TokenType::Refresh {
            return Err(TokenError::NotFound.into());
        }
        let record_id = Uuid::parse_str(&claims.jti).map_err(|_| TokenError::NotFound)?;

        let record = self
            .store("find refresh token", self.repository.find_by_id(record_id))
            .await?
            .filter(|record| record.user_id.to_string() == claims.sub)
            .ok_or(TokenError::NotFound)?;

        if record.is_revoked {
            if record.was_rotated() {
                let revoked = self
                    .store("revoke token family", self.repository.revoke_family(record.family_id))
                    .await?;
                warn!(
                    user_id = %record.user_id,
                    family_id = %record.family_id,
                    revoked,
                    "Rotated refresh token presented again, family revoked"
                );
            }
            return Err(TokenError::Revoked.into());
        }

        if record.is_expired() {
            return Err(TokenError::Expired.into());
        }

        let user = match self
            .store("find token owner", users.find_by_id(record.user_id))
            .await?
        {
            Some(user) if user.is_active() => user,
            _ => {
                self.store("revoke token family", self.repository.revoke_family(record.family_id))
                    .await?;
                return Err(TokenError::Revoked.into());
            }
        };

        let replacement = record.successor(self.config.refresh_token_ttl);
        let pair = self.pair_for(&user, &replacement)?;

        let rotated = self
            .store("rotate refresh token", self.repository.rotate(record.id, &replacement))
            .await?;
        if !rotated {
            debug!(token_id = %record.id, "Refresh token consumed concurrently");
            return Err(TokenError::Revoked.into());
        }

        debug!(user_id = %user.id, from = %record.id, to = %replacement.id, "Rotated refresh token");
        Ok(pair)
    }

    /// Revokes the record behind a refresh token value.
    ///
    /// Idempotent: unknown, malformed, expired or already revoked values are
    /// accepted silently. Only store unavailability is reported.
    pub async fn revoke(&self, value: &str) -> Result<(), DomainError> {
        let mut validation = self.refresh_validation.clone();
        validation.validate_exp = false;

        let record_id = match decode::<RefreshClaims>(value, &self.refresh_decoding, &validation)
            .ok()
            .and_then(|data| Uuid::parse_str(&data.claims.jti).ok())
        {
            Some(id) => id,
            None => {
                debug!("Ignoring revocation of an unreadable refresh token");
                return Ok(());
            }
        };

        let revoked = self
            .store("revoke refresh token", self.repository.revoke(record_id))
            .await?;
        debug!(token_id = %record_id, revoked, "Refresh token revocation");
        Ok(())
    }

    /// Revokes every refresh token of a user
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let revoked = self
            .store("revoke user tokens", self.repository.revoke_all_for_user(user_id))
            .await?;
        debug!(user_id = %user_id, revoked, "Revoked all refresh tokens for user");
        Ok(revoked)
    }

    /// Issues a password reset token bound to the user's current password
    pub fn issue_password_reset(&self, user: &User) -> Result<String, DomainError> {
        let now = Utc::now();
        let claims = PasswordResetClaims {
            sub: user.id.to_string(),
            ver: user.password_version(),
            iat: now.timestamp(),
            exp: (now + self.config.password_reset_ttl).timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            typ: TokenType::PasswordReset,
        };
        self.encode_jwt(&claims, &self.access_encoding)
    }

    /// Verifies a password reset token's signature, lifetime and type.
    ///
    /// The caller still has to compare `ver` with the user's current password version.
    pub fn verify_password_reset(&self, token: &str) -> Result<PasswordResetClaims, TokenError> {
        let claims = decode::<PasswordResetClaims>(token, &self.access_decoding, &self.reset_validation)
            .map_err(|e| classify(&e))?
            .claims;
        if claims.typ != TokenType::PasswordReset {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    fn pair_for(&self, user: &User, record: &RefreshToken) -> Result<TokenPair, DomainError> {
        let claims = Claims::new_access_token(
            user.id,
            user.role,
            self.config.access_token_ttl,
            &self.config.issuer,
            &self.config.audience,
        );
        let access_token = self.encode_jwt(&claims, &self.access_encoding)?;
        let refresh_token = self.encode_jwt(
            &RefreshClaims::for_record(record, &self.config.issuer),
            &self.refresh_encoding,
        )?;

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.access_token_ttl.num_seconds(),
            record.expires_at,
        ))
    }

    /// Encodes claims into a JWT
    fn encode_jwt<T: Serialize>(&self, claims: &T, key: &EncodingKey) -> Result<String, DomainError> {
        encode(&Header::new(Algorithm::HS256), claims, key).map_err(|e| {
            error!(error = %e, "Failed to sign token");
            DomainError::Token(TokenError::GenerationFailed)
        })
    }

    async fn store<T, F>(&self, operation: &'static str, call: F) -> Result<T, DomainError>
    where
        F: std::future::Future<Output = Result<T, DomainError>>,
    {
        deadline::within(self.config.store_timeout, operation, call).await
    }
}

/// Maps a JWT decoding failure onto the token error taxonomy
fn classify(err: &jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::MissingRequiredClaim(_) => TokenError::Invalid,
        _ => TokenError::Malformed,
    }
}
