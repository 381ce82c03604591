//! Shared application state handed to every worker

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpRequest};
use cs_core::errors::DomainError;
use cs_core::repositories::{RateLimitStore, TokenRepository, UserRepository};
use cs_core::services::{
    AuthService, AuthServiceConfig, AuthorizationGate, Notifier, PasswordHasher, RateLimiter,
    TokenCleanupService, TokenService, TokenServiceConfig,
};
use cs_shared::AppConfig;

use crate::handlers::ApiError;

pub type DynAuthService = AuthService<dyn UserRepository, dyn TokenRepository>;
pub type DynTokenService = TokenService<dyn TokenRepository>;
pub type DynRateLimiter = RateLimiter<dyn RateLimitStore>;
pub type DynCleanupService = TokenCleanupService<dyn TokenRepository>;

/// Services shared by handlers and pipeline stages
pub struct AppState {
    pub auth_service: Arc<DynAuthService>,
    pub token_service: Arc<DynTokenService>,
    pub rate_limiter: Arc<DynRateLimiter>,
    pub gate: AuthorizationGate,
    pub cleanup: Arc<DynCleanupService>,
    pub app_name: String,
    pub api_prefix: String,
}

impl AppState {
    /// Wire the services over the given stores
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        counters: Arc<dyn RateLimitStore>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> Result<Self, DomainError> {
        let store_timeout = Duration::from_millis(config.auth.store_timeout_ms);

        let token_service = Arc::new(TokenService::new(
            Arc::clone(&tokens),
            TokenServiceConfig::from(&config.auth),
        ));
        let auth_service = Arc::new(AuthService::new(
            users,
            Arc::clone(&token_service),
            PasswordHasher::new(config.auth.bcrypt_cost)?,
            notifier,
            AuthServiceConfig {
                frontend_url: config.email.frontend_url.clone(),
                store_timeout,
            },
        ));
        let rate_limiter = Arc::new(RateLimiter::new(
            counters,
            config.rate_limit.clone(),
            store_timeout,
        ));
        let cleanup = Arc::new(TokenCleanupService::new(tokens, config.cleanup.clone()));

        Ok(Self {
            auth_service,
            token_service,
            rate_limiter,
            gate: AuthorizationGate::default(),
            cleanup,
            app_name: config.server.app_name.clone(),
            api_prefix: config.server.api_prefix.clone(),
        })
    }

    /// State registered on the app serving `req`
    pub fn of(req: &HttpRequest) -> Result<web::Data<AppState>, ApiError> {
        req.app_data::<web::Data<AppState>>()
            .cloned()
            .ok_or_else(|| DomainError::internal("application state is not registered").into())
    }
}
