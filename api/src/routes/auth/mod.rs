//! Authentication route handlers
//!
//! Login, registration, token refresh, logout and the password reset flow.
//! Each resource carries the rate limit class it is counted under.

pub mod login;
pub mod logout;
pub mod password;
pub mod refresh;
pub mod register;

use actix_web::web;
use cs_core::domain::entities::EndpointClass;

use crate::middleware::{AuthenticateStage, Pipeline, RateLimitStage};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/auth/login")
            .wrap(Pipeline::new().stage(RateLimitStage::new(EndpointClass::Login)))
            .route(web::post().to(login::login)),
    )
    .service(
        web::resource("/auth/register")
            .wrap(Pipeline::new().stage(RateLimitStage::new(EndpointClass::Registration)))
            .route(web::post().to(register::register)),
    )
    .service(web::resource("/auth/refresh").route(web::post().to(refresh::refresh)))
    .service(web::resource("/auth/logout").route(web::post().to(logout::logout)))
    .service(
        web::resource("/auth/logout-all")
            .wrap(Pipeline::new().stage(AuthenticateStage))
            .route(web::post().to(logout::logout_all)),
    )
    .service(
        web::resource("/auth/forgot-password")
            .wrap(
                Pipeline::new()
                    .stage(RateLimitStage::new(EndpointClass::PasswordReset))
                    .stage(RateLimitStage::new(EndpointClass::EmailSend)),
            )
            .route(web::post().to(password::forgot_password)),
    )
    .service(
        web::resource("/auth/reset-password")
            .wrap(Pipeline::new().stage(RateLimitStage::new(EndpointClass::PasswordReset)))
            .route(web::post().to(password::reset_password)),
    );
}
