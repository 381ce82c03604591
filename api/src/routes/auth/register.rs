use actix_web::{web, HttpResponse};
use cs_core::services::RegisterCommand;
use validator::Validate;

use crate::dto::{RegisterRequest, UserResponse};
use crate::handlers::ApiResult;
use crate::state::AppState;

/// Handler for POST /api/v1/auth/register
///
/// Creates a `USER` account and sends a welcome email in the background.
/// Responds 201 with the new profile; the client signs in separately.
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    let RegisterRequest {
        username,
        email,
        password,
    } = body.into_inner();

    let user = state
        .auth_service
        .register(RegisterCommand {
            username,
            email,
            password,
        })
        .await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}
