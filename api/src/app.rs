//! Application factory
//!
//! Builds the actix-web application around an already wired [`AppState`].
//! The deployment mode is passed in explicitly and decides which routes
//! exist.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::DefaultHeaders,
    web, App,
};
use cs_core::domain::entities::EndpointClass;
use cs_shared::Environment;
use tracing_actix_web::TracingLogger;

use crate::handlers::json_error_handler;
use crate::middleware::{Pipeline, RateLimitStage};
use crate::routes::{self, system};
use crate::state::AppState;

/// Create the application with every route and middleware
pub fn create_app(
    state: web::Data<AppState>,
    environment: Environment,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let prefix = state.api_prefix.clone();

    App::new()
        .app_data(state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(
            DefaultHeaders::new()
                .add(("X-Content-Type-Options", "nosniff"))
                .add(("X-Frame-Options", "DENY")),
        )
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(system::health_check))
        .service(
            web::scope(&prefix)
                .wrap(Pipeline::new().stage(RateLimitStage::new(EndpointClass::General)))
                .configure(move |cfg| routes::configure(cfg, environment)),
        )
        .default_service(web::route().to(system::not_found))
}
