//! Server-spawned enemies and their time-driven motion

use glam::Vec3;

use crate::ws::protocol::EnemyData;

/// Convert 0xRRGGBB to RGBA floats with opaque alpha
pub fn hex_to_rgba(hex: u32) -> [f32; 4] {
    let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
    let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
    let b = (hex & 0xFF) as f32 / 255.0;
    [r, g, b, 1.0]
}

/// An enemy flying from `source` toward `target`.
///
/// Position is never stored; it is derived from the synchronized clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    id: u32,
    health: i32,
    color: [f32; 4],
    spawn_time: i64,
    speed: f32,
    source: Vec3,
    target: Vec3,
}

impl Enemy {
    pub fn new(
        id: u32,
        health: i32,
        hex_color: u32,
        spawn_time: i64,
        speed: f32,
        source: Vec3,
        target: Vec3,
    ) -> Self {
        Self {
            id,
            health,
            color: hex_to_rgba(hex_color),
            spawn_time,
            speed,
            source,
            target,
        }
    }

    pub fn from_data(data: &EnemyData) -> Self {
        Self::new(
            data.id,
            data.health,
            data.color,
            data.start_time,
            data.speed,
            data.source.into(),
            data.target.into(),
        )
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    /// Zero-health enemies linger until the server removes them
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn spawn_time(&self) -> i64 {
        self.spawn_time
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn source(&self) -> Vec3 {
        self.source
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Interpolated position at game time `now` (ms).
    ///
    /// The factor is not clamped: past the nominal arrival time the enemy
    /// keeps travelling beyond its target until the server removes it.
    pub fn position(&self, now: i64) -> Vec3 {
        let factor = (now - self.spawn_time) as f32 * self.speed;
        self.source + (self.target - self.source) * factor
    }

    pub(super) fn set_health(&mut self, health: i32) {
        self.health = health;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn linear_enemy() -> Enemy {
        Enemy::new(1, 1, 0xFFFFFF, 0, 0.1, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0))
    }

    #[test]
    fn test_position_at_spawn_is_source() {
        let enemy = Enemy::new(
            4,
            1,
            0,
            1_000,
            0.0001,
            Vec3::new(1.5, -2.0, 3.25),
            Vec3::new(4.0, 0.0, 0.0),
        );
        assert_eq!(enemy.position(1_000), Vec3::new(1.5, -2.0, 3.25));
    }

    #[test]
    fn test_position_is_linear_in_time() {
        let enemy = linear_enemy();
        assert_eq!(enemy.position(0), Vec3::ZERO);
        assert!((enemy.position(5).x - 5.0).abs() < EPS);
        assert!((enemy.position(10).x - 10.0).abs() < EPS);
        assert_eq!(enemy.position(5).y, 0.0);
    }

    #[test]
    fn test_position_extrapolates_past_target() {
        let enemy = linear_enemy();
        assert!((enemy.position(15).x - 15.0).abs() < EPS);
    }

    #[test]
    fn test_position_before_spawn_runs_backwards() {
        let enemy = linear_enemy();
        assert!((enemy.position(-5).x + 5.0).abs() < EPS);
    }

    #[test]
    fn test_each_axis_is_independent() {
        let enemy = Enemy::new(
            2,
            1,
            0,
            100,
            0.01,
            Vec3::new(0.0, 2.0, -4.0),
            Vec3::new(4.0, 0.0, 0.0),
        );
        let p = enemy.position(150);
        assert!((p - Vec3::new(2.0, 1.0, -2.0)).length() < EPS);
    }

    #[test]
    fn test_hex_color() {
        let [r, g, b, a] = hex_to_rgba(0xFF8000);
        assert_eq!(r, 1.0);
        assert!((g - 128.0 / 255.0).abs() < EPS);
        assert_eq!(b, 0.0);
        assert_eq!(a, 1.0);
    }
}
