//! Counter stores behind the rate limiter.
//!
//! [`InMemoryRateLimitStore`] keeps windows per process, so each instance of
//! a multi-instance deployment counts separately. [`RedisRateLimitStore`]
//! shares counters across instances through an atomic Lua script.

mod memory;
#[cfg(feature = "redis-cache")]
mod redis_store;


pub use memory::InMemoryRateLimitStore;
#[cfg(feature = "redis-cache")]
pub use redis_store::RedisRateLimitStore;
