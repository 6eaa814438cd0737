//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Control message limit for observer WebSockets (per connection)
pub const OBSERVER_MSG_RATE_LIMIT: u32 = 10; // Max 10 messages per second

/// Per-observer rate limiter state
#[derive(Clone)]
pub struct ObserverRateLimiter {
    msg_limiter: Arc<Limiter>,
}

impl ObserverRateLimiter {
    pub fn new() -> Self {
        Self {
            msg_limiter: create_limiter(OBSERVER_MSG_RATE_LIMIT),
        }
    }

    /// Check if a control message is allowed (returns true if allowed)
    pub fn check_msg(&self) -> bool {
        self.msg_limiter.check().is_ok()
    }
}

impl Default for ObserverRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
