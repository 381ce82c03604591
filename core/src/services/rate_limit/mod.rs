//! Per endpoint-class request quotas.

mod limiter;


pub use limiter::RateLimiter;
