//! Authentication and authorization stages

use std::future::{ready, Ready};

use actix_web::{
    dev::{Payload, ServiceRequest},
    http::header::{HeaderMap, AUTHORIZATION},
    FromRequest, HttpMessage, HttpRequest,
};
use async_trait::async_trait;
use cs_core::domain::entities::{Identity, Role};
use cs_core::errors::AuthError;

use super::pipeline::Stage;
use crate::handlers::ApiError;
use crate::state::AppState;

/// Identity of the authenticated caller, available to handlers behind
/// [`AuthenticateStage`]
#[derive(Debug, Clone)]
pub struct AuthContext(pub Identity);

impl AuthContext {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

impl FromRequest for AuthContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .map(AuthContext)
                .ok_or_else(|| AuthError::Unauthenticated.into()),
        )
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Requires a valid access token and records the caller's identity
pub struct AuthenticateStage;

#[async_trait(?Send)]
impl Stage for AuthenticateStage {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    async fn before(&self, req: &ServiceRequest) -> Result<(), ApiError> {
        let state = AppState::of(req.request())?;
        let token = extract_bearer_token(req.headers()).ok_or(AuthError::Unauthenticated)?;
        let identity = state.token_service.verify_access(token)?;
        req.extensions_mut().insert(identity);
        Ok(())
    }
}

/// Requires the authenticated caller to hold a role
pub struct AuthorizeStage {
    required: Role,
}

impl AuthorizeStage {
    pub fn new(required: Role) -> Self {
        Self { required }
    }
}

#[async_trait(?Send)]
impl Stage for AuthorizeStage {
    fn name(&self) -> &'static str {
        "authorize"
    }

    async fn before(&self, req: &ServiceRequest) -> Result<(), ApiError> {
        let state = AppState::of(req.request())?;
        let identity = req
            .extensions()
            .get::<Identity>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)?;
        state.gate.authorize(&identity, self.required)?;
        Ok(())
    }
}
