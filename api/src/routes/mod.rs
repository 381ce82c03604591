//! Route table of the HTTP API.
//!
//! Each resource declares its own [`Pipeline`](crate::middleware::Pipeline);
//! the general rate limit wraps the whole prefix scope in `app.rs`.

pub mod admin;
pub mod auth;
pub mod system;
pub mod users;

use actix_web::web;
use cs_shared::Environment;
use tracing::debug;

/// Register every route below the API prefix.
///
/// Admin maintenance routes exist only outside production; in production
/// they are simply not registered and answer 404.
pub fn configure(cfg: &mut web::ServiceConfig, environment: Environment) {
    cfg.service(web::resource(["", "/"]).route(web::get().to(system::api_index)));
    auth::configure(cfg);
    users::configure(cfg);

    if environment.is_production() {
        debug!("Admin routes are not registered in production");
    } else {
        admin::configure(cfg);
    }
}
