use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::dto::{RefreshTokenRequest, TokenResponse};
use crate::handlers::ApiResult;
use crate::state::AppState;

/// Handler for POST /api/v1/auth/refresh
///
/// Exchanges a refresh token for a new pair. The presented token is consumed;
/// presenting it again fails with `Revoked` and ends the whole session family.
///
/// # Request Body
///
/// ```json
/// { "refreshToken": "eyJ..." }
/// ```
///
/// ## Errors
/// - 401 Unauthorized: `details.kind` is `Expired`, `Revoked` or `NotFound`
/// - 503 Service Unavailable: Token store unreachable; safe to retry
pub async fn refresh(
    state: web::Data<AppState>,
    body: web::Json<RefreshTokenRequest>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    let pair = state.auth_service.refresh(&body.refresh_token).await?;
    Ok(HttpResponse::Ok().json(TokenResponse::from(pair)))
}
