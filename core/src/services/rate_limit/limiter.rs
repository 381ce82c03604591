//! Fixed-window rate limiter over an injected counter store

use std::sync::Arc;
use std::time::Duration;

use cs_shared::{EndpointLimit, RateLimitConfig};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::entities::{ClientKey, EndpointClass, RateLimitTicket};
use crate::errors::DomainError;
use crate::repositories::RateLimitStore;
use crate::services::deadline;

/// Admits or rejects requests per (client, endpoint class).
///
/// All counting goes through [`RateLimitStore::increment_and_check`], which
/// is atomic per key; this type only maps classes to quotas and store
/// outcomes to tickets or errors.
pub struct RateLimiter<S: RateLimitStore + ?Sized> {
    store: Arc<S>,
    config: RateLimitConfig,
    timeout: Duration,
}

impl<S: RateLimitStore + ?Sized + 'static> RateLimiter<S> {
    pub fn new(store: Arc<S>, config: RateLimitConfig, timeout: Duration) -> Self {
        Self {
            store,
            config,
            timeout,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether forwarded-for headers identify the client
    pub fn trusts_proxy_headers(&self) -> bool {
        self.config.trust_proxy_headers
    }

    pub fn limit_for(&self, class: EndpointClass) -> EndpointLimit {
        match class {
            EndpointClass::General => self.config.general,
            EndpointClass::Login => self.config.login,
            EndpointClass::Registration => self.config.registration,
            EndpointClass::PasswordReset => self.config.password_reset,
            EndpointClass::EmailSend => self.config.email_send,
        }
    }

    /// Counter key for a client in a class
    pub fn key_for(client: &ClientKey, class: EndpointClass) -> String {
        format!("rl:{}:{}", class, client)
    }

    /// Count a request and decide whether it may proceed
    ///
    /// # Returns
    /// * `Ok(RateLimitTicket)` - Admitted
    /// * `Err(DomainError::RateLimited)` - Quota used up; carries the seconds until reset
    /// * `Err(DomainError::Transient)` - The counter store failed or timed out
    pub async fn check(
        &self,
        client: &ClientKey,
        class: EndpointClass,
    ) -> Result<RateLimitTicket, DomainError> {
        let limit = self.limit_for(class);
        if !self.config.enabled {
            return Ok(RateLimitTicket::unmetered(class, limit.max_requests));
        }

        let key = Self::key_for(client, class);
        let window = Duration::from_secs(limit.window_seconds);
        let state = deadline::within(
            self.timeout,
            "rate limit check",
            self.store.increment_and_check(&key, window, limit.max_requests),
        )
        .await?;

        let reset_after_seconds = ceil_seconds(state.reset_after);
        if !state.allowed {
            warn!(
                client = %client,
                class = %class,
                limit = limit.max_requests,
                retry_after = reset_after_seconds,
                "Rate limit exceeded"
            );
            return Err(DomainError::RateLimited {
                class,
                retry_after_seconds: reset_after_seconds,
                limit: limit.max_requests,
            });
        }

        Ok(RateLimitTicket {
            class,
            key: Some(key),
            window: state.window,
            limit: limit.max_requests,
            remaining: limit.max_requests.saturating_sub(state.count),
            reset_after_seconds,
            release_on_success: limit.skip_successful_requests,
        })
    }

    /// Hand back the slot of a request that should not have counted.
    ///
    /// Only the window the ticket was issued in is touched. Failures are
    /// logged only; the request already completed.
    pub async fn release(&self, ticket: &RateLimitTicket) {
        let Some(key) = ticket.key.as_deref() else {
            return;
        };
        let release = self.store.release(key, ticket.window);
        match deadline::within(self.timeout, "rate limit release", release).await {
            Ok(()) => debug!(key, window = ticket.window, "Released rate limit slot"),
            Err(e) => warn!(key, error = %e, "Failed to release rate limit slot"),
        }
    }

    /// Periodically drop idle windows from the counter store
    pub fn start_purge_task(self: Arc<Self>) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.purge_interval_seconds.max(1));
        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            loop {
                interval_timer.tick().await;
                match self.store.purge_idle().await {
                    Ok(0) => {}
                    Ok(purged) => info!(purged, "Purged idle rate limit windows"),
                    Err(e) => warn!(error = %e, "Rate limit purge failed"),
                }
            }
        })
    }
}

/// Whole seconds, rounded up, never zero
fn ceil_seconds(duration: Duration) -> u64 {
    let seconds = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    seconds.max(1)
}
