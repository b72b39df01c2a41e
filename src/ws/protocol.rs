//! WebSocket protocol message definitions
//! Every JSON frame is an envelope `{"type": <string>, "data": <payload>}`

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inbound message types this client understands
pub const SERVER_MESSAGE_TYPES: &[&str] = &[
    "game_started",
    "time_sync",
    "enemy_added",
    "enemy_damaged",
    "enemy_removed",
    "player_rotation_updated",
    "player_score_updated",
    "player_damaged",
    "game_over",
    "ask_name",
    "ready",
    "waiting",
    "matched",
];

/// Protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid message envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Malformed {kind} payload: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid game over reason: {0:?}")]
    InvalidReason(String),

    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A 3D vector as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<WireVec3> for Vec3 {
    fn from(v: WireVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for WireVec3 {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// Player roster entry in `game_started`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerData {
    pub username: String,
    pub health: i32,
    pub score: u32,
    pub position: WireVec3,
    /// Initial facing as (roll, pitch, yaw)
    pub rotation: WireVec3,
}

/// Payload of `enemy_added`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyData {
    pub id: u32,
    /// 0xRRGGBB
    pub color: u32,
    pub health: i32,
    pub source: WireVec3,
    pub target: WireVec3,
    #[serde(rename = "startTime", alias = "start_time")]
    pub start_time: i64,
    pub speed: f32,
}

/// Payload of `time_sync`; servers send either a bare integer or `{"time": n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TimeSyncWire")]
pub struct TimeSync {
    pub time: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimeSyncWire {
    Bare(i64),
    Wrapped { time: i64 },
}

impl From<TimeSyncWire> for TimeSync {
    fn from(wire: TimeSyncWire) -> Self {
        match wire {
            TimeSyncWire::Bare(time) | TimeSyncWire::Wrapped { time } => Self { time },
        }
    }
}

/// Payload of `enemy_removed`; a bare id or `{"id": n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EnemyRefWire")]
pub struct EnemyRef {
    pub id: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnemyRefWire {
    Bare(u32),
    Wrapped { id: u32 },
}

impl From<EnemyRefWire> for EnemyRef {
    fn from(wire: EnemyRefWire) -> Self {
        match wire {
            EnemyRefWire::Bare(id) | EnemyRefWire::Wrapped { id } => Self { id },
        }
    }
}

/// Why a match ended, parsed from `"<kind>:<username>"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GameOverReason {
    Won(String),
    Tied,
    Disconnected(String),
    Died(String),
}

impl FromStr for GameOverReason {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, username) = s
            .split_once(':')
            .ok_or_else(|| ProtocolError::InvalidReason(s.to_string()))?;

        match kind {
            "won" => Ok(Self::Won(username.to_string())),
            "tied" => Ok(Self::Tied),
            "disconnect" => Ok(Self::Disconnected(username.to_string())),
            "died" => Ok(Self::Died(username.to_string())),
            _ => Err(ProtocolError::InvalidReason(s.to_string())),
        }
    }
}

impl TryFrom<String> for GameOverReason {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Won(username) => write!(f, "won:{username}"),
            Self::Tied => write!(f, "tied:"),
            Self::Disconnected(username) => write!(f, "disconnect:{username}"),
            Self::Died(username) => write!(f, "died:{username}"),
        }
    }
}

impl From<GameOverReason> for String {
    fn from(reason: GameOverReason) -> Self {
        reason.to_string()
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Match roster; exactly two players in a well-formed match
    GameStarted { players: Vec<PlayerData> },

    /// Authoritative game clock in milliseconds
    TimeSync(TimeSync),

    EnemyAdded(EnemyData),

    EnemyDamaged { id: u32, health: i32 },

    EnemyRemoved(EnemyRef),

    /// Remote player's new orientation as (roll, pitch, yaw)
    PlayerRotationUpdated { username: String, rotation: WireVec3 },

    PlayerScoreUpdated { username: String, score: u32 },

    PlayerDamaged { username: String, health: i32 },

    GameOver(GameOverReason),

    // Lobby
    /// Server wants a username (again, if the last one was taken)
    AskName(String),

    /// Name accepted
    Ready(String),

    /// Queued for matchmaking
    Waiting(String),

    /// Paired with the named opponent
    Matched(String),
}

impl ServerMessage {
    /// Wire `type` tag of this message
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameStarted { .. } => "game_started",
            Self::TimeSync(_) => "time_sync",
            Self::EnemyAdded(_) => "enemy_added",
            Self::EnemyDamaged { .. } => "enemy_damaged",
            Self::EnemyRemoved(_) => "enemy_removed",
            Self::PlayerRotationUpdated { .. } => "player_rotation_updated",
            Self::PlayerScoreUpdated { .. } => "player_score_updated",
            Self::PlayerDamaged { .. } => "player_damaged",
            Self::GameOver(_) => "game_over",
            Self::AskName(_) => "ask_name",
            Self::Ready(_) => "ready",
            Self::Waiting(_) => "waiting",
            Self::Matched(_) => "matched",
        }
    }
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    #[serde(rename = "type")]
    kind: String,
}

/// Parse one inbound text frame.
///
/// Nothing is returned unless the whole payload decoded, so callers never
/// apply a partially understood message.
pub fn parse_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    let header: EnvelopeHeader = serde_json::from_str(text).map_err(ProtocolError::Envelope)?;

    if !SERVER_MESSAGE_TYPES.contains(&header.kind.as_str()) {
        return Err(ProtocolError::UnknownType(header.kind));
    }

    serde_json::from_str(text).map_err(|source| ProtocolError::Malformed {
        kind: header.kind,
        source,
    })
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Lobby reply to `ask_name`; sent as a raw text frame, not JSON
    #[serde(skip)]
    Name(String),

    PlayerReady {},

    /// Calibrated orientation, yaw inverted
    PlayerRotationUpdated { x: f32, y: f32, z: f32 },

    EnemyShot { id: u32 },
}

impl ClientMessage {
    /// Encode for a text frame
    pub fn to_wire(&self) -> Result<String, ProtocolError> {
        match self {
            Self::Name(name) => Ok(name.clone()),
            other => serde_json::to_string(other).map_err(ProtocolError::Encode),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::PlayerReady {} => "player_ready",
            Self::PlayerRotationUpdated { .. } => "player_rotation_updated",
            Self::EnemyShot { .. } => "enemy_shot",
        }
    }
}
