//! Shared fixtures for the HTTP integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::header,
    test, web,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use cs_api::AppState;
use cs_core::domain::entities::{RefreshToken, Role, User};
use cs_core::errors::DomainError;
use cs_core::repositories::{RateLimitStore, TokenRepository, UserRepository, WindowState};
use cs_core::services::{Notification, Notifier, PasswordHasher};
use cs_infra::{InMemoryRateLimitStore, InMemoryTokenRepository, InMemoryUserRepository};
use cs_shared::{AppConfig, Environment};

pub const PASSWORD: &str = "Passw0rd-123";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.environment = Environment::Test;
    config.auth.access_secret = "integration-access-secret".to_string();
    config.auth.refresh_secret = "integration-refresh-secret".to_string();
    config.auth.bcrypt_cost = 4;
    config.cleanup.enabled = false;
    config
}

/// Keeps every notification so tests can read reset links
#[derive(Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl CapturingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_reset_token(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|n| match n {
            Notification::PasswordResetRequested { reset_link, .. } => reset_link
                .split("token=")
                .nth(1)
                .map(str::to_string),
            _ => None,
        })
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        Ok(())
    }
}

/// Counter store that is always down
pub struct UnavailableCounterStore;

#[async_trait]
impl RateLimitStore for UnavailableCounterStore {
    async fn increment_and_check(
        &self,
        _key: &str,
        _window: Duration,
        _max: u32,
    ) -> Result<WindowState, DomainError> {
        Err(DomainError::internal("connection refused"))
    }

    async fn release(&self, _key: &str, _window: u64) -> Result<(), DomainError> {
        Err(DomainError::internal("connection refused"))
    }
}

/// Token store whose expired-record sweep always fails; everything else is
/// served by the wrapped in-memory store
pub struct SweepFailingTokenStore(pub Arc<InMemoryTokenRepository>);

#[async_trait]
impl TokenRepository for SweepFailingTokenStore {
    async fn insert(&self, token: &RefreshToken) -> Result<(), DomainError> {
        self.0.insert(token).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshToken>, DomainError> {
        self.0.find_by_id(id).await
    }

    async fn revoke(&self, id: Uuid) -> Result<bool, DomainError> {
        self.0.revoke(id).await
    }

    async fn rotate(&self, old_id: Uuid, replacement: &RefreshToken) -> Result<bool, DomainError> {
        self.0.rotate(old_id, replacement).await
    }

    async fn revoke_family(&self, family_id: Uuid) -> Result<usize, DomainError> {
        self.0.revoke_family(family_id).await
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize, DomainError> {
        self.0.revoke_all_for_user(user_id).await
    }

    async fn delete_expired_before(&self, _before: DateTime<Utc>) -> Result<usize, DomainError> {
        Err(DomainError::internal("lock wait timeout exceeded"))
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub users: Arc<InMemoryUserRepository>,
    pub tokens: Arc<InMemoryTokenRepository>,
    pub notifier: Arc<CapturingNotifier>,
    pub config: AppConfig,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_counters(Arc::new(InMemoryRateLimitStore::new()))
    }

    pub fn with_counters(counters: Arc<dyn RateLimitStore>) -> Self {
        Self::build(test_config(), counters, |tokens| tokens)
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, Arc::new(InMemoryRateLimitStore::new()), |tokens| tokens)
    }

    /// Context whose token store fails every expired-record sweep
    pub fn with_failing_sweep() -> Self {
        Self::build(
            test_config(),
            Arc::new(InMemoryRateLimitStore::new()),
            |tokens| Arc::new(SweepFailingTokenStore(tokens)),
        )
    }

    /// `wrap_tokens` decides which store the app sees; `tokens` keeps the
    /// in-memory store underneath for assertions
    fn build(
        config: AppConfig,
        counters: Arc<dyn RateLimitStore>,
        wrap_tokens: impl FnOnce(Arc<InMemoryTokenRepository>) -> Arc<dyn TokenRepository>,
    ) -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let tokens = Arc::new(InMemoryTokenRepository::new());
        let notifier = Arc::new(CapturingNotifier::default());
        let state = AppState::new(
            users.clone(),
            wrap_tokens(tokens.clone()),
            counters,
            notifier.clone(),
            &config,
        )
        .expect("state wires up");

        Self {
            state: web::Data::new(state),
            users,
            tokens,
            notifier,
            config,
        }
    }

    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        let hasher = PasswordHasher::new(4).unwrap();
        let hash = hasher.hash(PASSWORD).await.unwrap();
        let user = User::new(
            username.to_string(),
            format!("{}@example.com", username),
            hash,
        )
        .with_role(role);
        self.users.create(user).await.unwrap()
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}{}", self.config.server.api_prefix, path)
    }
}

pub fn post_json(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post().uri(uri).set_json(body)
}

pub fn bearer(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
}

pub fn login_body(username: &str, password: &str) -> Value {
    json!({ "username": username, "password": password })
}

/// Log in through the API and return `(accessToken, refreshToken)`
pub async fn login<S, B>(app: &S, ctx: &TestContext, username: &str) -> (String, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = post_json(&ctx.api("/auth/login"), login_body(username, PASSWORD)).to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200, "login of {} failed", username);
    let body: Value = test::read_body_json(resp).await;
    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}

/// Let background notification tasks run
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}
