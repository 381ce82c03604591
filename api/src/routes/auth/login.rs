use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::dto::{LoginRequest, TokenResponse};
use crate::handlers::ApiResult;
use crate::state::AppState;

/// Handler for POST /api/v1/auth/login
///
/// # Request Body
///
/// ```json
/// {
///     "username": "alice",
///     "password": "correct horse 1"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "accessToken": "eyJ...",
///     "refreshToken": "eyJ...",
///     "tokenType": "Bearer",
///     "expiresIn": 900
/// }
/// ```
///
/// ## Errors
/// - 401 Unauthorized: Unknown username or wrong password, indistinguishably
/// - 403 Forbidden: Account suspended
/// - 429 Too Many Requests: Too many failed attempts from this client
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    let pair = state
        .auth_service
        .login(&body.username, &body.password)
        .await?;
    Ok(HttpResponse::Ok().json(TokenResponse::from(pair)))
}
