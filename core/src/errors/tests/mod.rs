use super::*;

#[test]
fn test_only_transient_is_retryable() {
    assert!(DomainError::transient("store timeout").is_retryable());
    assert!(!DomainError::internal("boom").is_retryable());
    assert!(!DomainError::from(TokenError::Revoked).is_retryable());
    assert!(!DomainError::from(AuthError::Forbidden).is_retryable());
    assert!(!DomainError::RateLimited {
        class: EndpointClass::Login,
        retry_after_seconds: 60,
        limit: 5,
    }
    .is_retryable());
}

#[test]
fn test_bridged_errors_are_transparent() {
    let err: DomainError = TokenError::Expired.into();
    assert_eq!(err.to_string(), "Token expired");

    let err: DomainError = AuthError::InvalidCredentials.into();
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[test]
fn test_rate_limited_message_names_the_window() {
    let err = DomainError::RateLimited {
        class: EndpointClass::PasswordReset,
        retry_after_seconds: 120,
        limit: 3,
    };
    assert_eq!(
        err.to_string(),
        "Rate limit exceeded for password-reset: retry after 120s"
    );
}

#[test]
fn test_token_error_kinds() {
    assert_eq!(TokenError::Expired.kind(), "Expired");
    assert_eq!(TokenError::Revoked.kind(), "Revoked");
    assert_eq!(TokenError::NotFound.kind(), "NotFound");
}
