//! Account routes for the authenticated caller

use actix_web::{web, HttpResponse};

use crate::dto::UserResponse;
use crate::handlers::ApiResult;
use crate::middleware::{AuthContext, AuthenticateStage, Pipeline};
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users/me")
            .wrap(Pipeline::new().stage(AuthenticateStage))
            .route(web::get().to(me)),
    );
}

/// Handler for GET /users/me
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "id": "6f1c...",
///     "username": "alice",
///     "email": "alice@example.com",
///     "role": "USER",
///     "status": "ACTIVE",
///     "createdAt": "2024-01-01T00:00:00Z"
/// }
/// ```
pub async fn me(state: web::Data<AppState>, auth: AuthContext) -> ApiResult<HttpResponse> {
    let user = state.auth_service.profile(auth.identity()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
