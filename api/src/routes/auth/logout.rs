use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::dto::RefreshTokenRequest;
use crate::handlers::ApiResult;
use crate::middleware::AuthContext;
use crate::state::AppState;

/// Handler for POST /api/v1/auth/logout
///
/// Revokes the presented refresh token. Repeating the call, or presenting an
/// unknown token, still answers 204.
pub async fn logout(
    state: web::Data<AppState>,
    body: web::Json<RefreshTokenRequest>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    state.auth_service.logout(&body.refresh_token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Handler for POST /api/v1/auth/logout-all
///
/// Revokes every refresh token of the authenticated caller.
pub async fn logout_all(
    state: web::Data<AppState>,
    auth: AuthContext,
) -> ApiResult<HttpResponse> {
    state.auth_service.logout_all(auth.identity()).await?;
    Ok(HttpResponse::NoContent().finish())
}
