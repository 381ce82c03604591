//! Email delivery for account notifications.
//!
//! Both notifiers implement `cs_core`'s `Notifier`; callers dispatch through
//! it fire-and-forget, so errors returned here only end up in the log.

mod logging;
mod resend;

use std::sync::Arc;

use cs_core::services::Notifier;
use cs_shared::config::email::EmailProvider;
use cs_shared::EmailConfig;

use crate::InfrastructureError;

pub use logging::LoggingNotifier;
pub use resend::ResendNotifier;

/// Create the notifier selected by `EMAIL_PROVIDER`
pub fn create_notifier(config: &EmailConfig) -> Result<Arc<dyn Notifier>, InfrastructureError> {
    match config.provider {
        EmailProvider::Log => {
            tracing::info!("Email notifications are logged, not delivered");
            Ok(Arc::new(LoggingNotifier::new()))
        }
        EmailProvider::Resend => {
            tracing::info!(from = %config.from, "Email notifications delivered through Resend");
            Ok(Arc::new(ResendNotifier::new(config)?))
        }
    }
}
