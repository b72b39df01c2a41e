//! Tick rates for the local clock and render loop

use std::time::Duration;

/// Local game clock advances this much per clock tick (ms)
pub const DEFAULT_CLOCK_TICK_MS: u64 = 20;
/// Render ticks per second
pub const DEFAULT_RENDER_TPS: u32 = 60;

/// Period of one tick at `tps` ticks per second. Zero is treated as one.
pub fn tick_period(tps: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(tps.max(1)))
}

/// A monotonic stopwatch used for frame statistics
#[derive(Debug, Clone)]
pub struct Timer {
    start: std::time::Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn reset(&mut self) {
        self.start = std::time::Instant::now();
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_period() {
        assert_eq!(tick_period(50), Duration::from_millis(20));
        assert_eq!(tick_period(60), Duration::from_micros(16_666));
        assert_eq!(tick_period(0), Duration::from_secs(1));
    }
}
