//! Token cleanup service for periodic removal of expired refresh tokens

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cs_shared::CleanupConfig;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::TokenRepository;

/// Service for cleaning up expired refresh token records
pub struct TokenCleanupService<R: TokenRepository + ?Sized + 'static> {
    repository: Arc<R>,
    config: CleanupConfig,
}

impl<R: TokenRepository + ?Sized + 'static> TokenCleanupService<R> {
    /// Create a new token cleanup service
    pub fn new(repository: Arc<R>, config: CleanupConfig) -> Self {
        Self { repository, config }
    }

    /// Delete every record whose `expires_at` lies before now.
    ///
    /// Idempotent: a second sweep with no new expirations removes nothing.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records removed
    /// * `Err(DomainError)` - The store failed; nothing is retried here
    pub async fn sweep(&self) -> Result<usize, DomainError> {
        let cutoff = Utc::now();
        let deleted = self.repository.delete_expired_before(cutoff).await?;
        info!(deleted, cutoff = %cutoff, "Expired refresh tokens removed");
        Ok(deleted)
    }

    /// Start the sweep as a background task running every configured interval.
    ///
    /// Failures are logged and the next tick tries again. Returns `None` when
    /// the recurring sweep is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Token cleanup service is disabled");
            return None;
        }

        let period = Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = period.as_secs(),
                "Token cleanup service started"
            );

            let mut interval_timer = tokio::time::interval(period);
            interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.sweep().await {
                    error!(error = %e, "Token cleanup cycle failed, retrying next interval");
                }
            }
        }))
    }
}
