mod service_tests;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::domain::entities::User;
use crate::repositories::{MockTokenRepository, MockUserRepository};

use super::{TokenService, TokenServiceConfig};

pub(super) fn test_config() -> TokenServiceConfig {
    TokenServiceConfig {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_token_ttl: Duration::minutes(15),
        refresh_token_ttl: Duration::days(7),
        password_reset_ttl: Duration::minutes(30),
        issuer: "content-scraper".to_string(),
        audience: "content-scraper-api".to_string(),
        leeway_seconds: 0,
        store_timeout: StdDuration::from_millis(2000),
    }
}

pub(super) fn test_user() -> User {
    User::new(
        "alice".to_string(),
        "alice@example.com".to_string(),
        "$2b$04$unused".to_string(),
    )
}

pub(super) struct Fixture {
    pub tokens: Arc<MockTokenRepository>,
    pub users: Arc<MockUserRepository>,
    pub service: TokenService<MockTokenRepository>,
    pub user: User,
}

pub(super) fn fixture_with(config: TokenServiceConfig) -> Fixture {
    let user = test_user();
    let tokens = Arc::new(MockTokenRepository::new());
    let users = Arc::new(MockUserRepository::with_users(vec![user.clone()]));
    let service = TokenService::new(tokens.clone(), config);
    Fixture {
        tokens,
        users,
        service,
        user,
    }
}

pub(super) fn fixture() -> Fixture {
    fixture_with(test_config())
}
