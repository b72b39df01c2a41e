//! Match state: players, enemies, shooting and frame snapshots

pub mod combat;
pub mod enemy;
pub mod player;
pub mod snapshot;
pub mod state;

pub use combat::{ShotOutcome, Weapon, WeaponStats};
pub use enemy::Enemy;
pub use player::Player;
pub use snapshot::{CameraView, EnemyView, FrameSnapshot, PlayerView};
pub use state::{Camera, Game, CAMERA_FORWARD, CAMERA_UP, MATCH_PLAYERS};

use serde::Serialize;

/// Where the client is in the match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Connected, waiting for the lobby to pair us
    AwaitingMatch,
    /// Paired; `player_ready` sent or pending
    ReadyPending,
    /// Match in progress
    Playing,
    /// Terminal reason received
    GameOver,
}

/// Errors raised while applying events to a match
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("match needs exactly 2 players, got {0}")]
    InvalidRoster(usize),

    #[error("player {0} appears twice in roster")]
    DuplicatePlayer(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("no active match")]
    NoActiveMatch,

    #[error("{0} is not a match event")]
    NotAMatchEvent(&'static str),
}
