//! Client-side match state, driven by server events and local ticks

use glam::Vec3;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::math::{EulerAngles, Quaternion};
use crate::orientation::{CameraInterpolator, INTERPOLATION_TICKS};
use crate::ws::protocol::{ClientMessage, EnemyData, GameOverReason, PlayerData, ServerMessage};

use super::combat::{ShotOutcome, Weapon, WeaponStats};
use super::enemy::Enemy;
use super::player::Player;
use super::snapshot::FrameSnapshot;
use super::GameError;

/// Players per match
pub const MATCH_PLAYERS: usize = 2;

/// Camera forward axis before any rotation
pub const CAMERA_FORWARD: Vec3 = Vec3::X;
/// Camera up axis
pub const CAMERA_UP: Vec3 = Vec3::Y;

/// Camera placement in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    /// Unit vector the camera looks along
    pub facing: Vec3,
}

impl Camera {
    pub fn center(&self) -> Vec3 {
        self.eye + self.facing
    }
}

/// The aggregate root of a running match.
///
/// Every field changes only through the `apply_*`, tick and input methods
/// below; callers read through the query methods.
#[derive(Debug, Clone)]
pub struct Game {
    local_username: String,
    players: Vec<Player>,
    enemies: BTreeMap<u32, Enemy>,
    /// Synchronized game clock (ms)
    time: i64,
    weapon: Weapon,
    camera: Camera,
    interpolator: CameraInterpolator,
    pending_orientation: Option<Quaternion>,
    game_over: Option<GameOverReason>,
    outbox: Vec<ClientMessage>,
}

impl Game {
    /// Build a match from the `game_started` roster.
    ///
    /// The camera starts at the local player's spawn point, facing along the
    /// local player's initial rotation.
    pub fn start(roster: &[PlayerData], local_username: &str) -> Result<Self, GameError> {
        Self::with_weapon(roster, local_username, WeaponStats::default())
    }

    pub fn with_weapon(
        roster: &[PlayerData],
        local_username: &str,
        weapon: WeaponStats,
    ) -> Result<Self, GameError> {
        if roster.len() != MATCH_PLAYERS {
            return Err(GameError::InvalidRoster(roster.len()));
        }

        let mut players: Vec<Player> = Vec::with_capacity(MATCH_PLAYERS);
        for data in roster {
            if players.iter().any(|p| p.username() == data.username) {
                return Err(GameError::DuplicatePlayer(data.username.clone()));
            }
            players.push(Player::from_data(data));
        }

        let local = players
            .iter()
            .find(|p| p.username() == local_username)
            .ok_or_else(|| GameError::UnknownPlayer(local_username.to_string()))?;

        let initial = local.initial_rotation().to_quaternion();
        let camera = Camera {
            eye: local.position(),
            facing: initial.rotate(CAMERA_FORWARD).normalize_or_zero(),
        };

        info!(
            username = %local_username,
            eye = ?camera.eye,
            "Match state initialised"
        );

        Ok(Self {
            local_username: local_username.to_string(),
            players,
            enemies: BTreeMap::new(),
            time: 0,
            weapon: Weapon::new(weapon),
            camera,
            interpolator: CameraInterpolator::starting_at(initial, INTERPOLATION_TICKS),
            pending_orientation: None,
            game_over: None,
            outbox: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Server events
    // ------------------------------------------------------------------

    /// Dispatch a match event. Lobby messages and `game_started` belong to
    /// the engine and are rejected here.
    pub fn apply(&mut self, msg: &ServerMessage) -> Result<(), GameError> {
        match msg {
            ServerMessage::TimeSync(sync) => self.apply_time_sync(sync.time),
            ServerMessage::EnemyAdded(data) => self.apply_enemy_added(data),
            ServerMessage::EnemyDamaged { id, health } => {
                self.apply_enemy_damaged(*id, *health);
            }
            ServerMessage::EnemyRemoved(enemy) => {
                self.apply_enemy_removed(enemy.id);
            }
            ServerMessage::PlayerRotationUpdated { username, rotation } => {
                let angles = EulerAngles::new(rotation.x, rotation.y, rotation.z);
                self.apply_player_rotation_updated(username, angles)?;
            }
            ServerMessage::PlayerScoreUpdated { username, score } => {
                self.apply_player_score_updated(username, *score)?;
            }
            ServerMessage::PlayerDamaged { username, health } => {
                self.apply_player_damaged(username, *health)?;
            }
            ServerMessage::GameOver(reason) => {
                self.apply_game_over(reason.clone());
            }
            other => return Err(GameError::NotAMatchEvent(other.kind())),
        }
        Ok(())
    }

    /// Snap the local clock to the server's
    pub fn apply_time_sync(&mut self, server_time: i64) {
        let drift = self.time - server_time;
        if drift != 0 {
            debug!(local = self.time, server = server_time, drift, "Clock resynchronised");
        }
        self.time = server_time;
    }

    pub fn apply_enemy_added(&mut self, data: &EnemyData) {
        let enemy = Enemy::from_data(data);
        debug!(enemy_id = data.id, start_time = data.start_time, "Enemy added");
        if self.enemies.insert(data.id, enemy).is_some() {
            warn!(enemy_id = data.id, "Enemy id reused, replacing previous enemy");
        }
    }

    /// Returns false for an unknown id
    pub fn apply_enemy_damaged(&mut self, id: u32, health: i32) -> bool {
        match self.enemies.get_mut(&id) {
            Some(enemy) => {
                enemy.set_health(health);
                true
            }
            None => {
                debug!(enemy_id = id, "Damage for unknown enemy ignored");
                false
            }
        }
    }

    /// Idempotent: removing an unknown id is a no-op
    pub fn apply_enemy_removed(&mut self, id: u32) -> Option<Enemy> {
        let removed = self.enemies.remove(&id);
        if removed.is_none() {
            debug!(enemy_id = id, "Removal of unknown enemy ignored");
        }
        removed
    }

    pub fn apply_player_damaged(&mut self, username: &str, health: i32) -> Result<(), GameError> {
        let player = self.player_mut(username)?;
        player.set_health(health);
        info!(username = %username, health = player.health(), "Player damaged");
        Ok(())
    }

    pub fn apply_player_score_updated(&mut self, username: &str, score: u32) -> Result<(), GameError> {
        self.player_mut(username)?.set_score(score);
        debug!(username = %username, score, "Score updated");
        Ok(())
    }

    pub fn apply_player_rotation_updated(
        &mut self,
        username: &str,
        rotation: EulerAngles,
    ) -> Result<(), GameError> {
        self.player_mut(username)?.set_rotation(rotation);
        Ok(())
    }

    /// Record the terminal reason. Only the first call has any effect.
    pub fn apply_game_over(&mut self, reason: GameOverReason) -> bool {
        if let Some(existing) = &self.game_over {
            debug!(existing = %existing, ignored = %reason, "Game already over");
            return false;
        }
        info!(reason = %reason, "Game over");
        self.game_over = Some(reason);
        true
    }

    // ------------------------------------------------------------------
    // Local ticks and input
    // ------------------------------------------------------------------

    /// Advance the local clock between server syncs. Stops once the game is over.
    pub fn increase_time(&mut self, delta_ms: i64) {
        if self.game_over.is_none() {
            self.time += delta_ms;
        }
    }

    /// Queue the latest camera orientation; older pending values are replaced
    pub fn set_new_orientation(&mut self, orientation: Quaternion) {
        self.pending_orientation = Some(orientation);
    }

    pub fn set_camera_eye(&mut self, eye: Vec3) {
        self.camera.eye = eye;
    }

    /// Point the camera directly; overwritten by the next render tick's blend
    pub fn set_camera(&mut self, eye: Vec3, facing: Vec3) {
        self.camera = Camera {
            eye,
            facing: facing.normalize_or_zero(),
        };
    }

    /// Per-frame update: camera blend and weapon cooldown
    pub fn render_tick(&mut self) {
        let orientation = self.interpolator.tick(self.pending_orientation.take());
        self.camera.facing = orientation.rotate(CAMERA_FORWARD).normalize_or_zero();
        self.weapon.tick();
    }

    /// Fire along the camera ray at live enemies. `None` while cooling down or
    /// after game over; a hit queues `enemy_shot` for the server.
    pub fn shoot(&mut self) -> Option<ShotOutcome> {
        if self.game_over.is_some() {
            return None;
        }

        let now = self.time;
        let targets = self
            .enemies
            .values()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| (enemy.id(), enemy.position(now)));
        let outcome = self.weapon.fire(self.camera.eye, self.camera.facing, targets)?;

        match outcome {
            ShotOutcome::Hit(id) => {
                info!(enemy_id = id, "Enemy hit");
                self.outbox.push(ClientMessage::EnemyShot { id });
            }
            ShotOutcome::Miss => debug!("Shot missed"),
        }
        Some(outcome)
    }

    /// Take messages queued for the server
    pub fn drain_outbox(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn pending_outbox(&self) -> &[ClientMessage] {
        &self.outbox
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn local_username(&self) -> &str {
        &self.local_username
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, username: &str) -> Result<&Player, GameError> {
        self.players
            .iter()
            .find(|p| p.username() == username)
            .ok_or_else(|| GameError::UnknownPlayer(username.to_string()))
    }

    pub fn local_player(&self) -> Result<&Player, GameError> {
        self.player(&self.local_username)
    }

    /// The other participant
    pub fn ally(&self) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.username() != self.local_username)
    }

    /// Enemies in ascending id order
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn camera_eye(&self) -> Vec3 {
        self.camera.eye
    }

    pub fn camera_center(&self) -> Vec3 {
        self.camera.center()
    }

    pub fn orientation(&self) -> Quaternion {
        self.interpolator.current()
    }

    pub fn cooldown(&self) -> u32 {
        self.weapon.cooldown()
    }

    pub fn last_shot(&self) -> Option<ShotOutcome> {
        self.weapon.last_outcome()
    }

    pub fn game_over_reason(&self) -> Option<&GameOverReason> {
        self.game_over.as_ref()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(self)
    }

    fn player_mut(&mut self, username: &str) -> Result<&mut Player, GameError> {
        self.players
            .iter_mut()
            .find(|p| p.username() == username)
            .ok_or_else(|| GameError::UnknownPlayer(username.to_string()))
    }
}
