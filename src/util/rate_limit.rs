//! Rate limiting for outbound rotation updates

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Max rotation updates per second
pub const ROTATION_RATE_LIMIT: u32 = 30;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Gate for `player_rotation_updated` messages.
///
/// A rate of zero disables throttling.
#[derive(Clone)]
pub struct RotationThrottle {
    limiter: Option<Arc<Limiter>>,
    dropped: u64,
}

impl RotationThrottle {
    pub fn new(per_second: u32) -> Self {
        Self {
            limiter: (per_second > 0).then(|| create_limiter(per_second)),
            dropped: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Returns true if an update may be sent now
    pub fn check(&mut self) -> bool {
        let allowed = self
            .limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok());
        if !allowed {
            self.dropped += 1;
        }
        allowed
    }

    /// Updates suppressed so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl std::fmt::Debug for RotationThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationThrottle")
            .field("limited", &self.limiter.is_some())
            .field("dropped", &self.dropped)
            .finish()
    }
}
