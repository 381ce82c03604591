//! Rate limiting stage

use actix_web::{
    dev::ServiceRequest,
    http::{
        header::{HeaderMap, HeaderName, HeaderValue},
        StatusCode,
    },
    HttpMessage, HttpRequest,
};
use async_trait::async_trait;
use cs_core::domain::entities::{EndpointClass, RateLimitTicket};

use super::{client_ip::client_key, pipeline::Stage};
use crate::handlers::ApiError;
use crate::state::AppState;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Tickets granted to the current request, one per class
#[derive(Debug, Default, Clone)]
pub struct GrantedTickets(Vec<RateLimitTicket>);

impl GrantedTickets {
    pub fn get(&self, class: EndpointClass) -> Option<&RateLimitTicket> {
        self.0.iter().find(|t| t.class == class)
    }
}

/// Counts the request against one endpoint class
pub struct RateLimitStage {
    class: EndpointClass,
}

impl RateLimitStage {
    pub fn new(class: EndpointClass) -> Self {
        Self { class }
    }
}

#[async_trait(?Send)]
impl Stage for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate-limit"
    }

    async fn before(&self, req: &ServiceRequest) -> Result<(), ApiError> {
        let state = AppState::of(req.request())?;
        let limiter = &state.rate_limiter;
        let client = client_key(req.request(), limiter.trusts_proxy_headers());
        let ticket = limiter.check(&client, self.class).await?;

        let mut extensions = req.extensions_mut();
        match extensions.get_mut::<GrantedTickets>() {
            Some(granted) => granted.0.push(ticket),
            None => {
                extensions.insert(GrantedTickets(vec![ticket]));
            }
        }
        Ok(())
    }

    async fn after(&self, req: &HttpRequest, status: StatusCode, headers: &mut HeaderMap) {
        let ticket = req
            .extensions()
            .get::<GrantedTickets>()
            .and_then(|granted| granted.get(self.class).cloned());
        let Some(ticket) = ticket else {
            return;
        };

        if ticket.key.is_some() && !headers.contains_key(&LIMIT_HEADER) {
            headers.insert(LIMIT_HEADER, HeaderValue::from(ticket.limit));
            headers.insert(REMAINING_HEADER, HeaderValue::from(ticket.remaining));
            headers.insert(RESET_HEADER, HeaderValue::from(ticket.reset_after_seconds));
        }

        if ticket.release_on_success && status.is_success() {
            if let Ok(state) = AppState::of(req) {
                state.rate_limiter.release(&ticket).await;
            }
        }
    }
}
