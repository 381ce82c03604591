//! Outbound notifications sent after account events.
//!
//! Delivery is fire-and-forget: [`dispatch`] spawns the send and only logs
//! failures, so a mail outage never fails the operation that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::DomainError;

/// An account event worth telling the user about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Welcome {
        to: String,
        username: String,
    },
    PasswordResetRequested {
        to: String,
        username: String,
        reset_link: String,
        expires_in_minutes: i64,
    },
    PasswordChanged {
        to: String,
        username: String,
    },
}

impl Notification {
    pub fn recipient(&self) -> &str {
        match self {
            Notification::Welcome { to, .. }
            | Notification::PasswordResetRequested { to, .. }
            | Notification::PasswordChanged { to, .. } => to,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "welcome",
            Notification::PasswordResetRequested { .. } => "password_reset_requested",
            Notification::PasswordChanged { .. } => "password_changed",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "Welcome to Content Scraper",
            Notification::PasswordResetRequested { .. } => "Reset your password",
            Notification::PasswordChanged { .. } => "Your password was changed",
        }
    }

    /// Plain-text body
    pub fn body(&self) -> String {
        match self {
            Notification::Welcome { username, .. } => {
                format!("Hi {},\n\nYour account has been created.", username)
            }
            Notification::PasswordResetRequested {
                username,
                reset_link,
                expires_in_minutes,
                ..
            } => format!(
                "Hi {},\n\nUse the link below to choose a new password. It expires in {} minutes.\n\n{}\n\nIf you did not ask for this, ignore this email.",
                username, expires_in_minutes, reset_link
            ),
            Notification::PasswordChanged { username, .. } => format!(
                "Hi {},\n\nYour password was just changed and all sessions were signed out.",
                username
            ),
        }
    }
}

/// Delivers notifications to users
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError>;
}

/// Send in the background, logging instead of propagating failures
pub fn dispatch<N>(notifier: Arc<N>, notification: Notification) -> JoinHandle<()>
where
    N: Notifier + ?Sized + 'static,
{
    tokio::spawn(async move {
        match notifier.send(&notification).await {
            Ok(()) => debug!(kind = notification.kind(), "Notification sent"),
            Err(e) => warn!(
                kind = notification.kind(),
                error = %e,
                "Failed to send notification"
            ),
        }
    })
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every notification it is asked to send
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        failing: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failing: true,
            }
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
            if self.failing {
                return Err(DomainError::internal("mail provider down"));
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(notification.clone());
            }
            Ok(())
        }
    }
}
