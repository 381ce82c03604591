use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client, Script};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use cs_core::errors::DomainError;
use cs_core::repositories::{RateLimitStore, WindowState};
use cs_shared::CacheConfig;

use crate::InfrastructureError;

/// Count one hit unless the window is already full.
///
/// The counter is a hash holding `count` and `window`. The first hit of a
/// window stamps `window` with the server time in microseconds and sets the
/// key's expiry; a key left without an expiry is given one.
///
/// KEYS[1] counter, ARGV[1] window in ms, ARGV[2] max.
/// Returns {allowed, count, ms until reset, window id}.
const INCREMENT_AND_CHECK: &str = r#"
local id = redis.call('HGET', KEYS[1], 'window')
local current = tonumber(redis.call('HGET', KEYS[1], 'count') or '0')
local ttl = redis.call('PTTL', KEYS[1])
local window = tonumber(ARGV[1])
if not id then
    local now = redis.call('TIME')
    id = now[1] .. string.format('%06d', tonumber(now[2]))
    current = 0
    redis.call('HSET', KEYS[1], 'window', id, 'count', 0)
    redis.call('PEXPIRE', KEYS[1], window)
    ttl = window
elseif ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], window)
    ttl = window
end
if current >= tonumber(ARGV[2]) then
    return {0, current, ttl, id}
end
current = redis.call('HINCRBY', KEYS[1], 'count', 1)
return {1, current, ttl, id}
"#;

/// Decrement a counter without going below zero, only while the window it
/// was counted in is still the current one.
///
/// KEYS[1] counter, ARGV[1] window id.
const RELEASE: &str = r#"
if redis.call('HGET', KEYS[1], 'window') ~= ARGV[1] then
    return 0
end
local current = tonumber(redis.call('HGET', KEYS[1], 'count') or '0')
if current > 0 then
    return redis.call('HINCRBY', KEYS[1], 'count', -1)
end
return 0
"#;

/// Fixed-window counters shared across instances through Redis.
///
/// Each check is one Lua script call, which Redis runs atomically.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    connection: MultiplexedConnection,
    config: CacheConfig,
    increment: Script,
    release: Script,
}

impl RedisRateLimitStore {
    /// Connect to Redis, retrying with exponential backoff
    pub async fn connect(config: CacheConfig) -> Result<Self, InfrastructureError> {
        Self::connect_with_retry(config, 3, 100).await
    }

    pub async fn connect_with_retry(
        config: CacheConfig,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, InfrastructureError> {
        info!("Connecting rate limit store to Redis at {}", mask_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;
        let connect_timeout = Duration::from_secs(config.connection_timeout);

        let mut attempts = 0;
        let mut delay = retry_delay_ms;
        let connection = loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            let outcome = match timeout(connect_timeout, client.get_multiplexed_async_connection()).await {
                Ok(result) => result.map_err(InfrastructureError::Cache),
                Err(_) => Err(InfrastructureError::Config(format!(
                    "Redis connection timed out after {}s",
                    config.connection_timeout
                ))),
            };

            match outcome {
                Ok(connection) => break connection,
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(5000);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(e);
                }
            }
        };

        info!("Rate limit store connected to Redis");
        Ok(Self {
            connection,
            config,
            increment: Script::new(INCREMENT_AND_CHECK),
            release: Script::new(RELEASE),
        })
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment_and_check(
        &self,
        key: &str,
        window: Duration,
        max: u32,
    ) -> Result<WindowState, DomainError> {
        let mut connection = self.connection.clone();
        let window_ms = window.as_millis().max(1) as u64;

        let (allowed, count, ttl_ms, window_id): (i64, i64, i64, String) = self
            .increment
            .key(self.config.namespaced(key))
            .arg(window_ms)
            .arg(max)
            .invoke_async(&mut connection)
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Cache(e)))?;
        let window_id = window_id.parse::<u64>().map_err(|_| {
            DomainError::internal(format!("malformed rate limit window id '{}'", window_id))
        })?;

        Ok(WindowState {
            allowed: allowed == 1,
            count: count.clamp(0, u32::MAX as i64) as u32,
            reset_after: Duration::from_millis(ttl_ms.max(0) as u64),
            window: window_id,
        })
    }

    async fn release(&self, key: &str, window: u64) -> Result<(), DomainError> {
        let mut connection = self.connection.clone();
        let _: i64 = self
            .release
            .key(self.config.namespaced(key))
            .arg(window.to_string())
            .invoke_async(&mut connection)
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Cache(e)))?;
        Ok(())
    }
}

/// Mask credentials in a Redis URL for logging
fn mask_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
