//! Counter store behind the rate limiter.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::DomainError;

/// Outcome of one increment-and-check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Whether this request was admitted
    pub allowed: bool,
    /// Requests counted in the current window, never above `max`
    pub count: u32,
    /// Time until the current window resets
    pub reset_after: Duration,
    /// Identifies the window that was counted against. A key never reuses an
    /// id for a later window.
    pub window: u64,
}

/// Fixed-window request counters keyed by an opaque string.
///
/// Call sites depend only on this trait, so a per-process map and a store
/// shared across instances are interchangeable.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one request against `key` and report whether it is admitted.
    ///
    /// Must be a single atomic step per key. A window older than `window` is
    /// reset before counting; a rejected request does not increase the count.
    async fn increment_and_check(
        &self,
        key: &str,
        window: Duration,
        max: u32,
    ) -> Result<WindowState, DomainError>;

    /// Give back one request admitted in `window`. Never drops below zero.
    ///
    /// Does nothing once that window has ended, so a late release cannot
    /// free a slot in the window that replaced it.
    async fn release(&self, key: &str, window: u64) -> Result<(), DomainError>;

    /// Drop windows that have been idle past their length, returning how many
    async fn purge_idle(&self) -> Result<usize, DomainError> {
        Ok(0)
    }
}
