//! Ordered request pipeline.
//!
//! A [`Pipeline`] wraps a route with a fixed list of [`Stage`]s. Stages run
//! in declaration order before the handler; the first stage that fails ends
//! the request with its error response. Once a response exists, every stage
//! that let the request through gets to look at it, innermost first.

use std::{
    future::{ready, Ready},
    rc::Rc,
    task::{Context, Poll},
};

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{header::HeaderMap, StatusCode},
    Error, HttpRequest, ResponseError,
};
use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::handlers::ApiError;

/// One step of request admission
#[async_trait(?Send)]
pub trait Stage {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Admit the request or reject it with an error
    async fn before(&self, req: &ServiceRequest) -> Result<(), ApiError>;

    /// Observe the final response of an admitted request
    async fn after(&self, _req: &HttpRequest, _status: StatusCode, _headers: &mut HeaderMap) {}
}

/// Middleware factory holding the stages of one route
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Rc<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage; stages run in the order they are added
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Rc::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl<S, B> Transform<S, ServiceRequest> for Pipeline
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = PipelineMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PipelineMiddleware {
            service: Rc::new(service),
            stages: self.stages.clone().into(),
        }))
    }
}

pub struct PipelineMiddleware<S> {
    service: Rc<S>,
    stages: Rc<[Rc<dyn Stage>]>,
}

impl<S, B> Service<ServiceRequest> for PipelineMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let stages = Rc::clone(&self.stages);

        Box::pin(async move {
            for (index, stage) in stages.iter().enumerate() {
                if let Err(err) = stage.before(&req).await {
                    debug!(
                        stage = stage.name(),
                        path = %req.path(),
                        status = err.status_code().as_u16(),
                        "Request stopped by pipeline"
                    );
                    let mut response = err.error_response();
                    let http_req = req.request().clone();
                    let status = response.status();
                    for passed in stages[..index].iter().rev() {
                        passed.after(&http_req, status, response.headers_mut()).await;
                    }
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            let mut res = service.call(req).await?;
            let http_req = res.request().clone();
            let status = res.status();
            for stage in stages.iter().rev() {
                stage.after(&http_req, status, res.headers_mut()).await;
            }
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use actix_web::{http::header::HeaderValue, test, web, App, HttpResponse};
    use cs_core::errors::AuthError;

    /// Records the order in which hooks fire
    struct Recorder {
        name: &'static str,
        reject: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    #[async_trait(?Send)]
    impl Stage for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn before(&self, _req: &ServiceRequest) -> Result<(), ApiError> {
            self.log.borrow_mut().push(format!("before:{}", self.name));
            if self.reject {
                return Err(AuthError::Forbidden.into());
            }
            Ok(())
        }

        async fn after(&self, _req: &HttpRequest, status: StatusCode, headers: &mut HeaderMap) {
            self.log
                .borrow_mut()
                .push(format!("after:{}:{}", self.name, status.as_u16()));
            headers.insert(
                actix_web::http::header::HeaderName::from_static("x-recorded"),
                HeaderValue::from_static("seen"),
            );
        }
    }

    fn recorder(name: &'static str, reject: bool, log: &Rc<RefCell<Vec<String>>>) -> Recorder {
        Recorder {
            name,
            reject,
            log: Rc::clone(log),
        }
    }

    #[actix_web::test]
    async fn test_stages_run_in_order_and_unwind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let pipeline = Pipeline::new()
            .stage(recorder("first", false, &log))
            .stage(recorder("second", false, &log));
        assert_eq!(pipeline.stage_names(), vec!["first", "second"]);

        let app = test::init_service(App::new().service(
            web::resource("/").wrap(pipeline).to(|| async { HttpResponse::Ok().finish() }),
        ))
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("x-recorded").unwrap(), "seen");
        assert_eq!(
            *log.borrow(),
            vec!["before:first", "before:second", "after:second:200", "after:first:200"]
        );
    }

    #[actix_web::test]
    async fn test_rejection_short_circuits() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let pipeline = Pipeline::new()
            .stage(recorder("outer", false, &log))
            .stage(recorder("gate", true, &log))
            .stage(recorder("never", false, &log));

        let app = test::init_service(App::new().service(
            web::resource("/")
                .wrap(pipeline)
                .to(|| async { HttpResponse::Ok().finish() }),
        ))
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            *log.borrow(),
            vec!["before:outer", "before:gate", "after:outer:403"]
        );
    }
}
