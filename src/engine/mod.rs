//! Engine actor: serializes network, sensor, timer and render access to client state

pub mod state;
pub mod task;

pub use state::{Engine, EngineSettings, LobbyState};
pub use task::{supervise, EngineCommand, EngineHandle, EngineTask, StopReason, TickRates};

use crate::game::GameError;
use crate::orientation::SampleError;
use crate::ws::protocol::ProtocolError;

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Bad sensor sample: {0}")]
    Sample(#[from] SampleError),

    #[error("Server rejected player name {0}")]
    NameRejected(String),

    #[error("Not matched with an opponent")]
    NotMatched,

    #[error("Engine task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
