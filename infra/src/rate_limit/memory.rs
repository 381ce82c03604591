use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use cs_core::errors::DomainError;
use cs_core::repositories::{RateLimitStore, WindowState};

#[derive(Debug, Clone, Copy)]
struct Window {
    id: u64,
    count: u32,
    started: Instant,
    length: Duration,
}

impl Window {
    fn fresh(id: u64, now: Instant, length: Duration) -> Self {
        Self {
            id,
            count: 0,
            started: now,
            length,
        }
    }

    fn ends(&self) -> Instant {
        self.started + self.length
    }

    fn is_over(&self, now: Instant) -> bool {
        now >= self.ends()
    }
}

/// Fixed-window counters in a process-local map.
///
/// The map lock is held for the whole read-modify-write of a key and never
/// across an await point. Window ids come from one store-wide sequence, so a
/// key purged and started again never repeats an id.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
    last_window: AtomicU64,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked windows, idle ones included
    pub fn len(&self) -> usize {
        self.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_window_id(&self) -> u64 {
        self.last_window.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Window>>, DomainError> {
        self.windows
            .lock()
            .map_err(|_| DomainError::internal("rate limit table lock poisoned"))
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn increment_and_check(
        &self,
        key: &str,
        window: Duration,
        max: u32,
    ) -> Result<WindowState, DomainError> {
        let now = Instant::now();
        let mut windows = self.lock()?;

        let entry = windows
            .entry(key.to_string())
            .or_insert_with(|| Window::fresh(self.next_window_id(), now, window));
        if entry.is_over(now) {
            *entry = Window::fresh(self.next_window_id(), now, window);
        }

        let allowed = entry.count < max;
        if allowed {
            entry.count += 1;
        }

        Ok(WindowState {
            allowed,
            count: entry.count,
            reset_after: entry.ends().saturating_duration_since(now),
            window: entry.id,
        })
    }

    async fn release(&self, key: &str, window: u64) -> Result<(), DomainError> {
        let now = Instant::now();
        let mut windows = self.lock()?;
        match windows.get_mut(key) {
            Some(entry) if entry.id == window && !entry.is_over(now) => {
                entry.count = entry.count.saturating_sub(1);
            }
            _ => debug!(key, window, "Release for an ended window ignored"),
        }
        Ok(())
    }

    async fn purge_idle(&self) -> Result<usize, DomainError> {
        let now = Instant::now();
        let mut windows = self.lock()?;
        let before = windows.len();
        windows.retain(|_, w| !w.is_over(now));
        let purged = before - windows.len();
        if purged > 0 {
            debug!(purged, remaining = windows.len(), "Purged idle rate limit windows");
        }
        Ok(purged)
    }
}
