//! Mock implementation of RateLimitStore for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::DomainError;

use super::r#trait::{RateLimitStore, WindowState};

/// Counts without ever resetting windows on its own; tests start a new
/// window explicitly with [`MockRateLimitStore::start_new_window`]
#[derive(Default)]
pub struct MockRateLimitStore {
    /// key -> (count, window id)
    counts: Mutex<HashMap<String, (u32, u64)>>,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl MockRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn count(&self, key: &str) -> u32 {
        self.counts
            .lock()
            .map(|counts| counts.get(key).map(|(count, _)| *count).unwrap_or(0))
            .unwrap_or(0)
    }

    /// End the current window of `key`, as if its length had elapsed
    pub fn start_new_window(&self, key: &str) {
        if let Ok(mut counts) = self.counts.lock() {
            let entry = counts.entry(key.to_string()).or_insert((0, 1));
            *entry = (0, entry.1 + 1);
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.counts
            .lock()
            .map(|counts| counts.keys().cloned().collect())
            .unwrap_or_default()
    }

    async fn simulate(&self) -> Result<(), DomainError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::internal("simulated counter store failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RateLimitStore for MockRateLimitStore {
    async fn increment_and_check(
        &self,
        key: &str,
        window: Duration,
        max: u32,
    ) -> Result<WindowState, DomainError> {
        self.simulate().await?;
        let mut counts = self
            .counts
            .lock()
            .map_err(|_| DomainError::internal("poisoned"))?;
        let (count, id) = counts.entry(key.to_string()).or_insert((0, 1));
        let allowed = *count < max;
        if allowed {
            *count += 1;
        }
        Ok(WindowState {
            allowed,
            count: *count,
            reset_after: window,
            window: *id,
        })
    }

    async fn release(&self, key: &str, window: u64) -> Result<(), DomainError> {
        self.simulate().await?;
        let mut counts = self
            .counts
            .lock()
            .map_err(|_| DomainError::internal("poisoned"))?;
        if let Some((count, id)) = counts.get_mut(key) {
            if *id == window {
                *count = count.saturating_sub(1);
            }
        }
        Ok(())
    }
}
