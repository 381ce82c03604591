//! Maintenance routes, registered only outside production

use actix_web::{web, HttpResponse};
use cs_core::domain::entities::Role;
use serde_json::json;
use tracing::{error, info};

use crate::middleware::{AuthContext, AuthenticateStage, AuthorizeStage, Pipeline};
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/admin/cleanup-tokens")
            .wrap(
                Pipeline::new()
                    .stage(AuthenticateStage)
                    .stage(AuthorizeStage::new(Role::Admin)),
            )
            .route(web::post().to(cleanup_tokens)),
    );
}

/// Handler for POST /admin/cleanup-tokens
///
/// Runs one expired-token sweep on demand.
///
/// ## Success (200 OK)
/// ```json
/// { "status": "success", "deleted": 3 }
/// ```
///
/// ## Errors
/// - 401 Unauthorized: Missing or invalid access token
/// - 403 Forbidden: Caller is not an administrator
/// - 500 Internal Server Error: `{ "status": "error" }` when the store fails
pub async fn cleanup_tokens(state: web::Data<AppState>, auth: AuthContext) -> HttpResponse {
    match state.cleanup.sweep().await {
        Ok(deleted) => {
            info!(admin_id = %auth.identity().user_id(), deleted, "Manual token cleanup");
            HttpResponse::Ok().json(json!({
                "status": "success",
                "message": "Expired tokens cleaned up",
                "deleted": deleted,
            }))
        }
        Err(e) => {
            error!(error = %e, "Manual token cleanup failed");
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to clean up expired tokens",
            }))
        }
    }
}
