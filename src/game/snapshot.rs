//! Per-frame read-only view of the match for renderers

use glam::Vec3;
use serde::Serialize;

use crate::math::EulerAngles;
use crate::ws::protocol::GameOverReason;

use super::combat::ShotOutcome;
use super::state::{Game, CAMERA_UP};
use super::MatchPhase;

/// Look-at parameters for the frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraView {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyView {
    pub id: u32,
    pub position: Vec3,
    pub color: [f32; 4],
    pub health: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub username: String,
    pub health: i32,
    pub score: u32,
    pub position: Vec3,
    pub rotation: [f32; 3],
    pub initial_rotation: [f32; 3],
    pub is_local: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub phase: MatchPhase,
    pub time: i64,
    pub camera: Option<CameraView>,
    pub enemies: Vec<EnemyView>,
    pub players: Vec<PlayerView>,
    pub last_shot: Option<ShotOutcome>,
    pub cooldown: u32,
    pub game_over: Option<GameOverReason>,
}

fn angles(e: EulerAngles) -> [f32; 3] {
    [e.roll, e.pitch, e.yaw]
}

impl FrameSnapshot {
    /// Frame with no match data, shown in the lobby
    pub fn empty(phase: MatchPhase) -> Self {
        Self {
            phase,
            time: 0,
            camera: None,
            enemies: Vec::new(),
            players: Vec::new(),
            last_shot: None,
            cooldown: 0,
            game_over: None,
        }
    }

    /// Capture the match at its current clock. Enemies come out in ascending id order.
    pub fn capture(game: &Game) -> Self {
        let now = game.time();
        let camera = game.camera();

        let enemies = game
            .enemies()
            .map(|enemy| EnemyView {
                id: enemy.id(),
                position: enemy.position(now),
                color: enemy.color(),
                health: enemy.health(),
            })
            .collect();

        let players = game
            .players()
            .iter()
            .map(|player| PlayerView {
                username: player.username().to_string(),
                health: player.health(),
                score: player.score(),
                position: player.position(),
                rotation: angles(player.rotation()),
                initial_rotation: angles(player.initial_rotation()),
                is_local: player.username() == game.local_username(),
            })
            .collect();

        let phase = if game.is_game_over() {
            MatchPhase::GameOver
        } else {
            MatchPhase::Playing
        };

        Self {
            phase,
            time: now,
            camera: Some(CameraView {
                eye: camera.eye,
                center: camera.center(),
                up: CAMERA_UP,
            }),
            enemies,
            players,
            last_shot: game.last_shot(),
            cooldown: game.cooldown(),
            game_over: game.game_over_reason().cloned(),
        }
    }

    pub fn local_player(&self) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.is_local)
    }

    pub fn ally(&self) -> Option<&PlayerView> {
        self.players.iter().find(|p| !p.is_local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::{EnemyData, PlayerData, WireVec3};

    fn wire(x: f32, y: f32, z: f32) -> WireVec3 {
        WireVec3 { x, y, z }
    }

    fn game() -> Game {
        let roster = vec![
            PlayerData {
                username: "Alice".into(),
                health: 100,
                score: 3,
                position: wire(4.0, 0.0, 0.0),
                rotation: wire(0.0, std::f32::consts::PI, 0.0),
            },
            PlayerData {
                username: "Bob".into(),
                health: 80,
                score: 1,
                position: wire(-4.0, 0.0, 0.0),
                rotation: wire(0.0, 0.0, 0.0),
            },
        ];
        Game::start(&roster, "Bob").unwrap()
    }

    fn enemy(id: u32) -> EnemyData {
        EnemyData {
            id,
            color: 0xFF0000,
            health: 2,
            source: wire(0.0, 0.0, 0.0),
            target: wire(0.0, 10.0, 0.0),
            start_time: 0,
            speed: 0.001,
        }
    }

    #[test]
    fn test_capture_orders_enemies_and_evaluates_motion() {
        let mut game = game();
        game.apply_enemy_added(&enemy(7));
        game.apply_enemy_added(&enemy(2));
        game.apply_time_sync(100);

        let frame = game.snapshot();
        let ids: Vec<u32> = frame.enemies.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 7]);
        assert!((frame.enemies[0].position.y - 1.0).abs() < 1e-5);
        assert_eq!(frame.enemies[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(frame.time, 100);
        assert_eq!(frame.phase, MatchPhase::Playing);
    }

    #[test]
    fn test_capture_marks_local_player() {
        let frame = game().snapshot();
        assert_eq!(frame.local_player().unwrap().username, "Bob");
        assert_eq!(frame.ally().unwrap().username, "Alice");
        assert_eq!(frame.ally().unwrap().score, 3);

        let camera = frame.camera.unwrap();
        assert_eq!(camera.eye, Vec3::new(-4.0, 0.0, 0.0));
        assert!((camera.center - Vec3::new(-3.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(camera.up, Vec3::Y);
    }

    #[test]
    fn test_capture_after_game_over() {
        let mut game = game();
        game.apply_game_over(GameOverReason::Died("Alice".into()));
        let frame = game.snapshot();
        assert_eq!(frame.phase, MatchPhase::GameOver);
        assert_eq!(frame.game_over, Some(GameOverReason::Died("Alice".into())));
    }

    #[test]
    fn test_frame_serializes() {
        let frame = game().snapshot();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["phase"], "playing");
        assert_eq!(json["players"][0]["username"], "Alice");
    }
}
