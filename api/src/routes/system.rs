//! Health check, endpoint index and fallback handlers

use actix_web::{web, HttpRequest, HttpResponse};
use cs_shared::{error_codes, ErrorResponse};
use serde_json::json;

use crate::state::AppState;

/// Handler for GET /health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": state.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Handler for GET {prefix}/
pub async fn api_index(state: web::Data<AppState>) -> HttpResponse {
    let prefix = state.api_prefix.trim_end_matches('/');
    let path = |p: &str| format!("{}{}", prefix, p);

    HttpResponse::Ok().json(json!({
        "message": format!("{} API", state.app_name),
        "endpoints": {
            "health": "/health",
            "auth": {
                "login": {
                    "path": path("/auth/login"),
                    "method": "POST",
                    "request_body": { "username": "string", "password": "string" },
                    "responses": {
                        "200": "Token pair issued",
                        "401": "Invalid username or password",
                        "429": "Too many login attempts"
                    }
                },
                "register": {
                    "path": path("/auth/register"),
                    "method": "POST",
                    "request_body": {
                        "username": "string (3-32 chars)",
                        "email": "string",
                        "password": "string (min 8 chars, letter and digit)"
                    },
                    "responses": {
                        "201": "Account created",
                        "400": "Invalid input",
                        "409": "Username or email taken"
                    }
                },
                "refresh": {
                    "path": path("/auth/refresh"),
                    "method": "POST",
                    "request_body": { "refreshToken": "string" },
                    "responses": {
                        "200": "Rotated token pair",
                        "401": "Refresh token expired, revoked or unknown"
                    }
                },
                "logout": {
                    "path": path("/auth/logout"),
                    "method": "POST",
                    "request_body": { "refreshToken": "string" },
                    "responses": { "204": "Session ended" }
                },
                "logout_all": {
                    "path": path("/auth/logout-all"),
                    "method": "POST",
                    "requires_auth": true,
                    "responses": { "204": "Every session ended", "401": "Authentication required" }
                },
                "forgot_password": {
                    "path": path("/auth/forgot-password"),
                    "method": "POST",
                    "request_body": { "email": "string" },
                    "responses": { "202": "Reset link sent if the address is registered" }
                },
                "reset_password": {
                    "path": path("/auth/reset-password"),
                    "method": "POST",
                    "request_body": { "token": "string", "password": "string" },
                    "responses": { "204": "Password changed", "401": "Reset token invalid or expired" }
                }
            },
            "users": {
                "me": {
                    "path": path("/users/me"),
                    "method": "GET",
                    "requires_auth": true,
                    "responses": { "200": "Profile of the caller", "401": "Authentication required" }
                }
            }
        }
    }))
}

/// Fallback for unmatched paths
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        format!("No route for {} {}", req.method(), req.path()),
    ))
}
