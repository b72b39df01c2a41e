//! Per-frame camera smoothing between discrete orientation updates

use crate::math::{slerp, Quaternion};

/// Render ticks spent blending toward a new orientation
pub const INTERPOLATION_TICKS: u32 = 10;

/// Blends the displayed orientation from `source` to `target` over a fixed
/// number of render ticks.
///
/// A new target arriving mid-blend restarts from the currently displayed
/// orientation with a full-length window; only the latest target is kept.
#[derive(Debug, Clone)]
pub struct CameraInterpolator {
    source: Quaternion,
    target: Quaternion,
    current: Quaternion,
    timer: u32,
    window: u32,
}

impl CameraInterpolator {
    pub fn new(window: u32) -> Self {
        Self::starting_at(Quaternion::IDENTITY, window)
    }

    pub fn starting_at(orientation: Quaternion, window: u32) -> Self {
        Self {
            source: orientation,
            target: orientation,
            current: orientation,
            timer: 0,
            window: window.max(1),
        }
    }

    /// Advance one render tick, consuming a pending orientation if any.
    /// Must be called every frame, with or without new data.
    ///
    /// The first blend step runs on the tick the new target arrives, so the
    /// target is displayed after exactly `window` ticks counting that one.
    pub fn tick(&mut self, pending: Option<Quaternion>) -> Quaternion {
        if let Some(next) = pending {
            self.source = if self.timer == 0 {
                self.target
            } else {
                self.current
            };
            self.target = next;
            self.timer = self.window;
        }

        if self.timer > 0 {
            self.timer -= 1;
            let t = 1.0 - self.timer as f32 / self.window as f32;
            self.current = slerp(self.source, self.target, t);
        }

        self.current
    }

    pub fn current(&self) -> Quaternion {
        self.current
    }

    pub fn target(&self) -> Quaternion {
        self.target
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.timer
    }

    pub fn is_settled(&self) -> bool {
        self.timer == 0
    }
}

impl Default for CameraInterpolator {
    fn default() -> Self {
        Self::new(INTERPOLATION_TICKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::euler_to_quaternion;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_holds_without_updates() {
        let mut interp = CameraInterpolator::default();
        for _ in 0..5 {
            assert_eq!(interp.tick(None), Quaternion::IDENTITY);
        }
        assert!(interp.is_settled());
    }

    #[test]
    fn test_reaches_target_after_window() {
        let mut interp = CameraInterpolator::default();
        let target = euler_to_quaternion(0.0, 0.0, 1.0);

        let first = interp.tick(Some(target));
        // One tick in: a tenth of the way
        assert!(first.same_rotation(euler_to_quaternion(0.0, 0.0, 0.1), EPS));

        let mut last = first;
        for _ in 1..INTERPOLATION_TICKS {
            last = interp.tick(None);
        }
        assert!(interp.is_settled());
        assert!(last.same_rotation(target, EPS));

        // Holds the target afterwards
        assert!(interp.tick(None).same_rotation(target, EPS));
    }

    #[test]
    fn test_blend_starts_on_arrival_tick() {
        let mut interp = CameraInterpolator::default();
        let target = euler_to_quaternion(0.0, 0.0, 0.8);

        let first = interp.tick(Some(target));
        assert_ne!(first, Quaternion::IDENTITY);
        assert_eq!(interp.remaining_ticks(), INTERPOLATION_TICKS - 1);

        for _ in 1..INTERPOLATION_TICKS - 1 {
            interp.tick(None);
        }
        assert!(!interp.is_settled());
        assert!(!interp.current().same_rotation(target, 1e-6));

        interp.tick(None);
        assert!(interp.is_settled());
        assert!(interp.current().same_rotation(target, EPS));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut interp = CameraInterpolator::default();
        let target = euler_to_quaternion(0.0, 0.0, 1.5);
        let mut previous = 0.0;
        let mut pending = Some(target);
        for _ in 0..INTERPOLATION_TICKS {
            let q = interp.tick(pending.take());
            let yaw = crate::math::quaternion_to_euler(q).yaw;
            assert!(yaw > previous);
            previous = yaw;
        }
    }

    #[test]
    fn test_new_target_restarts_from_current_point() {
        let mut interp = CameraInterpolator::default();
        interp.tick(Some(euler_to_quaternion(0.0, 0.0, 1.0)));
        for _ in 0..4 {
            interp.tick(None);
        }
        let midway = interp.current();
        assert_eq!(interp.remaining_ticks(), 5);

        let second = euler_to_quaternion(0.0, 0.0, -1.0);
        let next = interp.tick(Some(second));

        // No jump: the first frame of the new blend stays close to where we were
        assert!(next.dot(midway).abs() > 0.98);
        assert_eq!(interp.remaining_ticks(), INTERPOLATION_TICKS - 1);
        assert_eq!(interp.target(), second);
    }
}
