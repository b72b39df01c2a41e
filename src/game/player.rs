//! Player records for the two match participants

use glam::Vec3;

use crate::math::EulerAngles;
use crate::ws::protocol::{PlayerData, WireVec3};

/// Upper bound of player health
pub const MAX_HEALTH: i32 = 100;

fn euler_from_wire(v: WireVec3) -> EulerAngles {
    EulerAngles::new(v.x, v.y, v.z)
}

/// One participant, local or ally
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    username: String,
    /// Spawn position, fixed for the whole match
    position: Vec3,
    rotation: EulerAngles,
    /// Facing at match start; the reference frame for display
    initial_rotation: EulerAngles,
    health: i32,
    score: u32,
}

impl Player {
    pub fn from_data(data: &PlayerData) -> Self {
        let rotation = euler_from_wire(data.rotation);
        Self {
            username: data.username.clone(),
            position: data.position.into(),
            rotation,
            initial_rotation: rotation,
            health: data.health.clamp(0, MAX_HEALTH),
            score: data.score,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> EulerAngles {
        self.rotation
    }

    pub fn initial_rotation(&self) -> EulerAngles {
        self.initial_rotation
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub(super) fn set_health(&mut self, health: i32) {
        self.health = health.clamp(0, MAX_HEALTH);
    }

    pub(super) fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    pub(super) fn set_rotation(&mut self, rotation: EulerAngles) {
        self.rotation = rotation;
    }
}
