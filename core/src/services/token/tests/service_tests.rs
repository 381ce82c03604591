//! Unit tests for the token service

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use super::{fixture, fixture_with, test_config};
use crate::domain::entities::{Role, TokenType};
use crate::errors::{DomainError, TokenError};
use crate::repositories::MockTokenRepository;
use crate::services::token::TokenService;

fn token_error(result: Result<impl std::fmt::Debug, DomainError>) -> TokenError {
    match result {
        Err(DomainError::Token(e)) => e,
        other => panic!("expected a token error, got {:?}", other),
    }
}

fn tamper_signature(token: &str, position: usize) -> String {
    let (head, signature) = token.rsplit_once('.').unwrap();
    let mut bytes = signature.as_bytes().to_vec();
    bytes[position] = if bytes[position] == b'A' { b'B' } else { b'A' };
    format!("{}.{}", head, String::from_utf8(bytes).unwrap())
}

#[tokio::test]
async fn test_issue_and_verify_access_token() {
    let f = fixture();
    let admin = f.user.clone().with_role(Role::Admin);
    let pair = f.service.issue(&admin).await.unwrap();

    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.expires_in, 15 * 60);
    assert_eq!(f.tokens.len().await, 1);

    let identity = f.service.verify_access(&pair.access_token).unwrap();
    assert_eq!(identity.user_id(), admin.id);
    assert_eq!(identity.role(), Role::Admin);
    assert!(!identity.token_id().is_empty());
}

#[tokio::test]
async fn test_tampered_signature_is_malformed() {
    let f = fixture();
    let pair = f.service.issue(&f.user).await.unwrap();

    for position in [0, 7, 20, 30] {
        let tampered = tamper_signature(&pair.access_token, position);
        assert_eq!(
            f.service.verify_access(&tampered),
            Err(TokenError::Malformed),
            "position {}",
            position
        );
    }
}

#[tokio::test]
async fn test_garbage_access_token_is_malformed() {
    let f = fixture();
    assert_eq!(f.service.verify_access("not-a-jwt"), Err(TokenError::Malformed));
    assert_eq!(f.service.verify_access(""), Err(TokenError::Malformed));
}

#[tokio::test]
async fn test_expired_access_token() {
    let mut config = test_config();
    config.access_token_ttl = Duration::seconds(-30);
    let f = fixture_with(config);
    let pair = f.service.issue(&f.user).await.unwrap();

    assert_eq!(f.service.verify_access(&pair.access_token), Err(TokenError::Expired));
}

#[tokio::test]
async fn test_foreign_issuer_is_invalid() {
    let f = fixture();
    let mut other = test_config();
    other.issuer = "someone-else".to_string();
    let foreign = TokenService::new(Arc::new(MockTokenRepository::new()), other);
    let pair = foreign.issue(&f.user).await.unwrap();

    assert_eq!(f.service.verify_access(&pair.access_token), Err(TokenError::Invalid));
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let f = fixture();
    let pair = f.service.issue(&f.user).await.unwrap();
    assert!(f.service.verify_access(&pair.refresh_token).is_err());
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_the_old_value() {
    let f = fixture();
    let pair = f.service.issue(&f.user).await.unwrap();

    let rotated = f.service.refresh(&pair.refresh_token, f.users.as_ref()).await.unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);
    assert!(f.service.verify_access(&rotated.access_token).is_ok());

    let second = f.service.refresh(&pair.refresh_token, f.users.as_ref()).await;
    assert_eq!(token_error(second), TokenError::Revoked);
}

#[tokio::test]
async fn test_reuse_revokes_the_family() {
    let f = fixture();
    let pair = f.service.issue(&f.user).await.unwrap();
    let rotated = f.service.refresh(&pair.refresh_token, f.users.as_ref()).await.unwrap();

    let reuse = f.service.refresh(&pair.refresh_token, f.users.as_ref()).await;
    assert_eq!(token_error(reuse), TokenError::Revoked);

    let descendant = f.service.refresh(&rotated.refresh_token, f.users.as_ref()).await;
    assert_eq!(token_error(descendant), TokenError::Revoked);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_succeeds_once() {
    let f = fixture();
    let pair = f.service.issue(&f.user).await.unwrap();
    let service = Arc::new(f.service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        let users = f.users.clone();
        let value = pair.refresh_token.clone();
        handles.push(tokio::spawn(async move {
            service.refresh(&value, users.as_ref()).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(matches!(e, DomainError::Token(TokenError::Revoked))),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_refresh_unknown_or_garbage_is_not_found() {
    let f = fixture();
    let other = TokenService::new(Arc::new(MockTokenRepository::new()), test_config());
    let foreign = other.issue(&f.user).await.unwrap();

    let unknown = f.service.refresh(&foreign.refresh_token, f.users.as_ref()).await;
    assert_eq!(token_error(unknown), TokenError::NotFound);

    let garbage = f.service.refresh("garbage", f.users.as_ref()).await;
    assert_eq!(token_error(garbage), TokenError::NotFound);

    let pair = f.service.issue(&f.user).await.unwrap();
    let wrong_kind = f.service.refresh(&pair.access_token, f.users.as_ref()).await;
    assert_eq!(token_error(wrong_kind), TokenError::NotFound);
}

#[tokio::test]
async fn test_refresh_expired_value() {
    let mut config = test_config();
    config.refresh_token_ttl = Duration::seconds(-30);
    let f = fixture_with(config);
    let pair = f.service.issue(&f.user).await.unwrap();

    let result = f.service.refresh(&pair.refresh_token, f.users.as_ref()).await;
    assert_eq!(token_error(result), TokenError::Expired);
}

#[tokio::test]
async fn test_refresh_after_logout_is_revoked() {
    let f = fixture();
    let first = f.service.issue(&f.user).await.unwrap();
    let second = f.service.issue(&f.user).await.unwrap();

    f.service.revoke(&first.refresh_token).await.unwrap();

    let result = f.service.refresh(&first.refresh_token, f.users.as_ref()).await;
    assert_eq!(token_error(result), TokenError::Revoked);

    // Logging out one session leaves other sessions alone
    assert!(f.service.refresh(&second.refresh_token, f.users.as_ref()).await.is_ok());
}

#[tokio::test]
async fn test_refresh_for_suspended_user_is_revoked() {
    let f = fixture();
    let pair = f.service.issue(&f.user).await.unwrap();

    let mut suspended = f.user.clone();
    suspended.suspend();
    f.users.put(suspended).await;

    let result = f.service.refresh(&pair.refresh_token, f.users.as_ref()).await;
    assert_eq!(token_error(result), TokenError::Revoked);
}

#[tokio::test]
async fn test_refresh_picks_up_current_role() {
    let f = fixture();
    let pair = f.service.issue(&f.user).await.unwrap();
    f.users.put(f.user.clone().with_role(Role::Admin)).await;

    let rotated = f.service.refresh(&pair.refresh_token, f.users.as_ref()).await.unwrap();
    let identity = f.service.verify_access(&rotated.access_token).unwrap();
    assert_eq!(identity.role(), Role::Admin);
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let f = fixture();
    let pair = f.service.issue(&f.user).await.unwrap();

    f.service.revoke(&pair.refresh_token).await.unwrap();
    f.service.revoke(&pair.refresh_token).await.unwrap();
    f.service.revoke("garbage").await.unwrap();
    f.service.revoke(&pair.access_token).await.unwrap();

    let records = f.tokens.all().await;
    assert_eq!(records.len(), 1);
    assert!(records[0].is_revoked);
    assert!(records[0].replaced_by.is_none());
}

#[tokio::test]
async fn test_revoke_all_for_user() {
    let f = fixture();
    let a = f.service.issue(&f.user).await.unwrap();
    let b = f.service.issue(&f.user).await.unwrap();

    assert_eq!(f.service.revoke_all_for_user(f.user.id).await.unwrap(), 2);
    assert_eq!(f.service.revoke_all_for_user(f.user.id).await.unwrap(), 0);

    for value in [a.refresh_token, b.refresh_token] {
        let result = f.service.refresh(&value, f.users.as_ref()).await;
        assert_eq!(token_error(result), TokenError::Revoked);
    }
}

#[tokio::test]
async fn test_store_failure_is_transient_and_verification_is_unaffected() {
    let f = fixture();
    let pair = f.service.issue(&f.user).await.unwrap();
    f.tokens.set_failing(true);

    let issue = f.service.issue(&f.user).await;
    assert!(matches!(issue, Err(DomainError::Transient { .. })));

    let refresh = f.service.refresh(&pair.refresh_token, f.users.as_ref()).await;
    assert!(refresh.unwrap_err().is_retryable());

    let revoke = f.service.revoke(&pair.refresh_token).await;
    assert!(revoke.unwrap_err().is_retryable());

    assert!(f.service.verify_access(&pair.access_token).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out_as_transient() {
    let mut config = test_config();
    config.store_timeout = StdDuration::from_millis(100);
    let f = fixture_with(config);
    f.tokens.set_delay(StdDuration::from_secs(5));

    let result = f.service.issue(&f.user).await;
    assert!(matches!(result, Err(DomainError::Transient { .. })));
}

#[tokio::test]
async fn test_password_reset_token() {
    let f = fixture();
    let token = f.service.issue_password_reset(&f.user).unwrap();

    let claims = f.service.verify_password_reset(&token).unwrap();
    assert_eq!(claims.user_id().unwrap(), f.user.id);
    assert_eq!(claims.ver, f.user.password_version());
    assert_eq!(claims.typ, TokenType::PasswordReset);

    // Neither token type is accepted in place of the other
    let pair = f.service.issue(&f.user).await.unwrap();
    assert!(f.service.verify_password_reset(&pair.access_token).is_err());
    assert!(f.service.verify_access(&token).is_err());
}

#[tokio::test]
async fn test_expired_password_reset_token() {
    let mut config = test_config();
    config.password_reset_ttl = Duration::minutes(-1);
    let f = fixture_with(config);
    let token = f.service.issue_password_reset(&f.user).unwrap();

    assert_eq!(f.service.verify_password_reset(&token), Err(TokenError::Expired));
}
