use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::dto::{ForgotPasswordRequest, ResetPasswordRequest};
use crate::handlers::ApiResult;
use crate::state::AppState;

/// Handler for POST /api/v1/auth/forgot-password
///
/// Always answers 202 so the response does not reveal whether the address
/// is registered.
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    state.auth_service.request_password_reset(&body.email).await?;
    Ok(HttpResponse::Accepted().json(json!({
        "message": "If the address is registered, a reset link has been sent"
    })))
}

/// Handler for POST /api/v1/auth/reset-password
///
/// Sets the new password and signs the account out everywhere. A reset
/// token works once: the password change invalidates it.
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    state
        .auth_service
        .reset_password(&body.token, &body.password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
