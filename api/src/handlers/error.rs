//! Mapping from domain errors to HTTP responses.
//!
//! Every failure leaves the API as an [`ErrorResponse`] body. Credential
//! failures carry generic messages; token failures expose their kind so
//! clients can tell an expired session from a revoked one; rate-limit and
//! transient failures carry `Retry-After`.

use std::fmt;

use actix_web::{
    error::JsonPayloadError,
    http::{header, StatusCode},
    HttpRequest, HttpResponse, ResponseError,
};
use serde_json::json;
use tracing::{error, warn};
use validator::ValidationErrors;

use cs_core::errors::{AuthError, DomainError, TokenError};
use cs_shared::{error_codes, ErrorResponse};

/// Seconds a client should wait before retrying after a transient failure
pub const TRANSIENT_RETRY_AFTER_SECONDS: u64 = 5;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error type returned by every handler and pipeline stage
#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    /// Request body failed field validation
    Validation(ValidationErrors),
    /// Request body could not be parsed
    BadRequest(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Domain(e) => write!(f, "{}", e),
            ApiError::Validation(e) => write!(f, "Validation failed: {}", e),
            ApiError::BadRequest(message) => write!(f, "Bad request: {}", message),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Domain(err.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Domain(err.into())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::Validation(err)
    }
}

impl ApiError {
    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Domain(err) => domain_body(err),
            ApiError::Validation(errors) => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, "Request validation failed")
                    .add_detail("fields", field_messages(errors))
            }
            ApiError::BadRequest(message) => {
                ErrorResponse::new(error_codes::BAD_REQUEST, message.clone())
            }
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::Domain(DomainError::RateLimited {
                retry_after_seconds,
                ..
            }) => Some(*retry_after_seconds),
            ApiError::Domain(DomainError::Transient { .. }) => Some(TRANSIENT_RETRY_AFTER_SECONDS),
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Domain(err) => domain_status(err),
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(error = %self, "Request rate limited");
        }

        let mut response = HttpResponse::build(status);
        if let Some(seconds) = self.retry_after() {
            response.insert_header((header::RETRY_AFTER, seconds.to_string()));
        }
        response.json(self.body())
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        DomainError::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::Auth(auth) => match auth {
            AuthError::InvalidCredentials | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden | AuthError::AccountSuspended => StatusCode::FORBIDDEN,
            AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        },
        DomainError::Token(TokenError::GenerationFailed) => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::Token(_) => StatusCode::UNAUTHORIZED,
    }
}

fn domain_body(err: &DomainError) -> ErrorResponse {
    match err {
        DomainError::Validation { message } => {
            ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone())
        }
        DomainError::NotFound { resource } => {
            ErrorResponse::new(error_codes::NOT_FOUND, format!("{} not found", resource))
        }
        DomainError::RateLimited {
            class,
            retry_after_seconds,
            limit,
        } => ErrorResponse::new(
            error_codes::RATE_LIMIT_EXCEEDED,
            format!(
                "Too many requests. Please try again in {} seconds",
                retry_after_seconds
            ),
        )
        .add_detail("class", class.as_str())
        .add_detail("limit", limit)
        .add_detail("retryAfterSeconds", retry_after_seconds),
        DomainError::Transient { .. } => ErrorResponse::new(
            error_codes::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable. Please retry shortly",
        ),
        DomainError::Internal { .. } => {
            ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred")
        }
        DomainError::Auth(auth) => match auth {
            AuthError::InvalidCredentials => ErrorResponse::new(
                error_codes::INVALID_CREDENTIALS,
                "Invalid username or password",
            ),
            AuthError::Unauthenticated => {
                ErrorResponse::new(error_codes::UNAUTHORIZED, "Authentication required")
            }
            AuthError::Forbidden => ErrorResponse::new(
                error_codes::FORBIDDEN,
                "You do not have permission to perform this action",
            ),
            AuthError::AccountSuspended => {
                ErrorResponse::new(error_codes::ACCOUNT_SUSPENDED, "Account is suspended")
            }
            AuthError::UserAlreadyExists => ErrorResponse::new(
                error_codes::USER_ALREADY_EXISTS,
                "Username or email is already registered",
            ),
        },
        DomainError::Token(token) => {
            let (code, message) = match token {
                TokenError::Malformed => (error_codes::TOKEN_MALFORMED, "Token is malformed"),
                TokenError::Expired => (error_codes::TOKEN_EXPIRED, "Token has expired"),
                TokenError::Invalid => (error_codes::TOKEN_INVALID, "Token is invalid"),
                TokenError::Revoked => (error_codes::TOKEN_REVOKED, "Token has been revoked"),
                TokenError::NotFound => (error_codes::TOKEN_NOT_FOUND, "Token not recognised"),
                TokenError::GenerationFailed => {
                    return ErrorResponse::new(
                        error_codes::INTERNAL_ERROR,
                        "An internal error occurred",
                    )
                }
            };
            ErrorResponse::new(code, message).add_detail("kind", token.kind())
        }
    }
}

fn field_messages(errors: &ValidationErrors) -> serde_json::Value {
    let fields: serde_json::Map<String, serde_json::Value> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), json!(messages))
        })
        .collect();
    serde_json::Value::Object(fields)
}

/// Turn body parse failures into the standard 400 error body
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}
