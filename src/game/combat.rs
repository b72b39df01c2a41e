//! Combat system - fire-rate cooldown and camera-ray hit detection

use glam::Vec3;
use serde::Serialize;

/// Samples taken along the camera ray
pub const RAY_STEPS: u32 = 80;
/// Distance between ray samples (world units)
pub const RAY_STEP_LENGTH: f32 = 0.15;
/// A sample this close to an enemy counts as a hit
pub const HIT_RADIUS: f32 = 0.2;
/// Render ticks between shots (about one shot per second at 60 ticks/s)
pub const SHOOT_COOLDOWN_TICKS: u32 = 60;

/// Weapon tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    pub ray_steps: u32,
    pub step_length: f32,
    pub hit_radius: f32,
    pub cooldown_ticks: u32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            ray_steps: RAY_STEPS,
            step_length: RAY_STEP_LENGTH,
            hit_radius: HIT_RADIUS,
            cooldown_ticks: SHOOT_COOLDOWN_TICKS,
        }
    }
}

impl WeaponStats {
    /// Farthest distance the ray reaches
    pub fn range(&self) -> f32 {
        self.ray_steps.saturating_sub(1) as f32 * self.step_length
    }
}

/// Result of a shot that was actually fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "enemy", rename_all = "snake_case")]
pub enum ShotOutcome {
    Hit(u32),
    Miss,
}

/// March a ray from `eye` along `facing` and return the first enemy hit.
///
/// Enemies are tested one at a time against every sample of the ray, in the
/// order given. The first enemy with any sample inside the hit radius wins,
/// even if a later enemy sits closer to the eye.
pub fn ray_hit_test<I>(eye: Vec3, facing: Vec3, targets: I, stats: &WeaponStats) -> Option<u32>
where
    I: IntoIterator<Item = (u32, Vec3)>,
{
    let direction = facing.normalize_or_zero();
    let radius_sq = stats.hit_radius * stats.hit_radius;

    targets.into_iter().find_map(|(id, position)| {
        (0..stats.ray_steps)
            .map(|step| eye + direction * (step as f32 * stats.step_length))
            .any(|sample| sample.distance_squared(position) <= radius_sq)
            .then_some(id)
    })
}

/// Shooting state: Ready when the cooldown is zero, cooling down otherwise
#[derive(Debug, Clone)]
pub struct Weapon {
    stats: WeaponStats,
    cooldown: u32,
    last_outcome: Option<ShotOutcome>,
}

impl Weapon {
    pub fn new(stats: WeaponStats) -> Self {
        Self {
            stats,
            cooldown: 0,
            last_outcome: None,
        }
    }

    pub fn can_fire(&self) -> bool {
        self.cooldown == 0
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Outcome of the last shot while its cooldown runs; cleared afterwards
    pub fn last_outcome(&self) -> Option<ShotOutcome> {
        self.last_outcome
    }

    /// Fire if ready. Returns `None` without touching any state while cooling down.
    pub fn fire<I>(&mut self, eye: Vec3, facing: Vec3, targets: I) -> Option<ShotOutcome>
    where
        I: IntoIterator<Item = (u32, Vec3)>,
    {
        if !self.can_fire() {
            return None;
        }

        let outcome = match ray_hit_test(eye, facing, targets, &self.stats) {
            Some(id) => ShotOutcome::Hit(id),
            None => ShotOutcome::Miss,
        };

        self.last_outcome = Some(outcome);
        self.cooldown = self.stats.cooldown_ticks;
        Some(outcome)
    }

    /// One render tick of cooldown
    pub fn tick(&mut self) {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            if self.cooldown == 0 {
                self.last_outcome = None;
            }
        }
    }
}

impl Default for Weapon {
    fn default() -> Self {
        Self::new(WeaponStats::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_enemy_on_axis() {
        let eye = Vec3::new(0.0, 0.0, 3.0);
        let hit = ray_hit_test(eye, Vec3::NEG_Z, [(1, Vec3::ZERO)], &WeaponStats::default());
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn test_ray_accepts_unnormalized_facing() {
        let eye = Vec3::new(0.0, 0.0, 3.0);
        let hit = ray_hit_test(
            eye,
            Vec3::new(0.0, 0.0, -7.5),
            [(9, Vec3::ZERO)],
            &WeaponStats::default(),
        );
        assert_eq!(hit, Some(9));
    }

    #[test]
    fn test_ray_misses_off_axis_enemy() {
        let eye = Vec3::new(0.0, 0.0, 3.0);
        let hit = ray_hit_test(
            eye,
            Vec3::NEG_Z,
            [(1, Vec3::new(0.5, 0.0, 0.0))],
            &WeaponStats::default(),
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn test_ray_has_limited_range() {
        let stats = WeaponStats::default();
        let beyond = stats.range() + 1.0;
        let hit = ray_hit_test(Vec3::ZERO, Vec3::X, [(1, Vec3::new(beyond, 0.0, 0.0))], &stats);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_first_enumerated_enemy_wins_over_nearer_one() {
        // Enemy 1 is farther down the ray than enemy 2 but is tested first
        let targets = [(1, Vec3::new(6.0, 0.0, 0.0)), (2, Vec3::new(1.5, 0.0, 0.0))];
        let hit = ray_hit_test(Vec3::ZERO, Vec3::X, targets, &WeaponStats::default());
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn test_cooldown_blocks_second_shot() {
        let mut weapon = Weapon::default();
        let first = weapon.fire(Vec3::ZERO, Vec3::X, [(1, Vec3::new(3.0, 0.0, 0.0))]);
        assert_eq!(first, Some(ShotOutcome::Hit(1)));
        assert_eq!(weapon.cooldown(), SHOOT_COOLDOWN_TICKS);

        let second = weapon.fire(Vec3::ZERO, Vec3::Y, std::iter::empty());
        assert_eq!(second, None);
        assert_eq!(weapon.last_outcome(), Some(ShotOutcome::Hit(1)));
        assert_eq!(weapon.cooldown(), SHOOT_COOLDOWN_TICKS);
    }

    #[test]
    fn test_cooldown_expiry_clears_outcome() {
        let mut weapon = Weapon::default();
        assert_eq!(
            weapon.fire(Vec3::ZERO, Vec3::X, std::iter::empty()),
            Some(ShotOutcome::Miss)
        );

        for _ in 0..SHOOT_COOLDOWN_TICKS - 1 {
            weapon.tick();
        }
        assert_eq!(weapon.last_outcome(), Some(ShotOutcome::Miss));
        assert!(!weapon.can_fire());

        weapon.tick();
        assert!(weapon.can_fire());
        assert_eq!(weapon.last_outcome(), None);

        // Ticking while ready is harmless
        weapon.tick();
        assert_eq!(weapon.cooldown(), 0);
    }
}
