//! Main authentication service implementation

use std::sync::Arc;
use std::time::Duration;

use chrono::{SubsecRound, Utc};
use cs_shared::validation::validators;
use tracing::{debug, info};

use crate::domain::entities::{Identity, TokenPair, User};
use crate::errors::{AuthError, DomainError, TokenError};
use crate::repositories::{TokenRepository, UserRepository};
use crate::services::deadline;
use crate::services::notification::{dispatch, Notification, Notifier};
use crate::services::token::TokenService;

use super::password::PasswordHasher;

/// Settings for the authentication service
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// Base URL of the frontend, used to build password reset links
    pub frontend_url: String,
    /// Deadline for each credential store call
    pub store_timeout: Duration,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            store_timeout: Duration::from_millis(2000),
        }
    }
}

/// Input for account creation
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Authentication service for the complete session lifecycle
pub struct AuthService<U, T>
where
    U: UserRepository + ?Sized,
    T: TokenRepository + ?Sized,
{
    /// Credential store
    user_repository: Arc<U>,
    /// Token service for JWT management
    token_service: Arc<TokenService<T>>,
    hasher: PasswordHasher,
    notifier: Arc<dyn Notifier>,
    config: AuthServiceConfig,
}

impl<U, T> AuthService<U, T>
where
    U: UserRepository + ?Sized,
    T: TokenRepository + ?Sized,
{
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `user_repository` - Credential store
    /// * `token_service` - Service for JWT token management
    /// * `hasher` - bcrypt hasher with the configured cost
    /// * `notifier` - Fire-and-forget email delivery
    /// * `config` - Service configuration
    pub fn new(
        user_repository: Arc<U>,
        token_service: Arc<TokenService<T>>,
        hasher: PasswordHasher,
        notifier: Arc<dyn Notifier>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            user_repository,
            token_service,
            hasher,
            notifier,
            config,
        }
    }

    pub fn token_service(&self) -> &Arc<TokenService<T>> {
        &self.token_service
    }

    /// Authenticate with username and password
    ///
    /// Unknown usernames and wrong passwords fail identically with
    /// `InvalidCredentials`. The store deadline covers the lookup only; the
    /// bcrypt comparison is CPU work and runs unbounded.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, DomainError> {
        let user = self
            .store("find user by username", self.user_repository.find_by_username(username))
            .await?;
        let hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = self.hasher.verify(password, hash).await?;
        let user = user
            .filter(|_| matches)
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active() {
            info!(user_id = %user.id, "Login refused for suspended account");
            return Err(AuthError::AccountSuspended.into());
        }

        let pair = self.token_service.issue(&user).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(pair)
    }

    /// Create a new account with the `USER` role and send a welcome email
    pub async fn register(&self, command: RegisterCommand) -> Result<User, DomainError> {
        let RegisterCommand {
            username,
            email,
            password,
        } = command;
        let email = email.trim().to_lowercase();

        if !validators::is_username(&username) {
            return Err(validation("username must be 3-32 letters, digits or underscores"));
        }
        if !validators::is_email(&email) {
            return Err(validation("email must be a valid email address"));
        }
        if !validators::is_strong_password(&password) {
            return Err(validation(
                "password must be at least 8 characters with a letter and a digit",
            ));
        }

        let taken_username = self
            .store("find user by username", self.user_repository.find_by_username(&username))
            .await?
            .is_some();
        let taken_email = self
            .store("find user by email", self.user_repository.find_by_email(&email))
            .await?
            .is_some();
        if taken_username || taken_email {
            return Err(AuthError::UserAlreadyExists.into());
        }

        let password_hash = self.hasher.hash(&password).await?;
        let user = self
            .store(
                "create user",
                self.user_repository.create(User::new(username, email, password_hash)),
            )
            .await?;

        info!(user_id = %user.id, "User registered");
        dispatch(
            self.notifier.clone(),
            Notification::Welcome {
                to: user.email.clone(),
                username: user.username.clone(),
            },
        );
        Ok(user)
    }

    /// Exchange a refresh token for a rotated pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        self.token_service
            .refresh(refresh_token, self.user_repository.as_ref())
            .await
    }

    /// End the session behind a refresh token; idempotent
    pub async fn logout(&self, refresh_token: &str) -> Result<(), DomainError> {
        self.token_service.revoke(refresh_token).await
    }

    /// End every session of the caller
    pub async fn logout_all(&self, identity: &Identity) -> Result<usize, DomainError> {
        let revoked = self
            .token_service
            .revoke_all_for_user(identity.user_id())
            .await?;
        info!(user_id = %identity.user_id(), revoked, "Signed out everywhere");
        Ok(revoked)
    }

    /// Email a password reset link if the address belongs to an active account.
    ///
    /// Succeeds whether or not the address is known.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let email = email.trim().to_lowercase();
        let user = self
            .store("find user by email", self.user_repository.find_by_email(&email))
            .await?;

        let Some(user) = user.filter(User::is_active) else {
            debug!("Password reset requested for an unknown or inactive address");
            return Ok(());
        };

        let token = self.token_service.issue_password_reset(&user)?;
        let reset_link = format!(
            "{}/reset-password?token={}",
            self.config.frontend_url.trim_end_matches('/'),
            token
        );
        dispatch(
            self.notifier.clone(),
            Notification::PasswordResetRequested {
                to: user.email.clone(),
                username: user.username.clone(),
                reset_link,
                expires_in_minutes: self.token_service.config().password_reset_ttl.num_minutes(),
            },
        );
        info!(user_id = %user.id, "Password reset link issued");
        Ok(())
    }

    /// Set a new password using a reset token, then sign out every session
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), DomainError> {
        let claims = self
            .token_service
            .verify_password_reset(token)
            .map_err(|e| match e {
                TokenError::Expired => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;
        let user_id = claims.user_id().map_err(|_| TokenError::Invalid)?;

        let user = self
            .store("find user by id", self.user_repository.find_by_id(user_id))
            .await?
            .filter(|user| user.is_active() && user.password_version() == claims.ver)
            .ok_or(TokenError::Invalid)?;

        if !validators::is_strong_password(new_password) {
            return Err(validation(
                "password must be at least 8 characters with a letter and a digit",
            ));
        }

        let password_hash = self.hasher.hash(new_password).await?;
        // The new version must differ from the one the token was issued for
        let changed_at = Utc::now()
            .trunc_subsecs(3)
            .max(user.password_changed_at + chrono::Duration::milliseconds(1));
        let updated = self
            .store(
                "update password",
                self.user_repository.update_password(
                    user.id,
                    &password_hash,
                    changed_at,
                    user.password_changed_at,
                ),
            )
            .await?;
        if !updated {
            debug!(user_id = %user.id, "Password changed concurrently; reset token refused");
            return Err(TokenError::Invalid.into());
        }

        let revoked = self.token_service.revoke_all_for_user(user.id).await?;
        info!(user_id = %user.id, revoked, "Password reset completed");

        dispatch(
            self.notifier.clone(),
            Notification::PasswordChanged {
                to: user.email.clone(),
                username: user.username.clone(),
            },
        );
        Ok(())
    }

    /// The caller's own account
    pub async fn profile(&self, identity: &Identity) -> Result<User, DomainError> {
        self.store("find user by id", self.user_repository.find_by_id(identity.user_id()))
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: "user".to_string(),
            })
    }

    async fn store<R, F>(&self, operation: &'static str, call: F) -> Result<R, DomainError>
    where
        F: std::future::Future<Output = Result<R, DomainError>>,
    {
        deadline::within(self.config.store_timeout, operation, call).await
    }
}

fn validation(message: &str) -> DomainError {
    DomainError::Validation {
        message: message.to_string(),
    }
}
