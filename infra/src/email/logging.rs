use async_trait::async_trait;
use tracing::info;

use cs_core::errors::DomainError;
use cs_core::services::{Notification, Notifier};

/// Writes notifications to the log instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        info!(
            to = notification.recipient(),
            kind = notification.kind(),
            subject = notification.subject(),
            "[email] {}",
            notification.body()
        );
        Ok(())
    }
}
