//! Synchronous engine core: one owner for lobby, sensor and match state

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::game::{FrameSnapshot, Game, MatchPhase, ShotOutcome, WeaponStats};
use crate::math::EulerAngles;
use crate::orientation::{CalibratedOrientation, OrientationCalibrator};
use crate::util::rate_limit::RotationThrottle;
use crate::ws::protocol::{ClientMessage, GameOverReason, ServerMessage};
use crate::ws::transport::TransportHandle;

use super::EngineError;

/// Engine tuning taken from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub player_name: String,
    pub auto_ready: bool,
    /// Max rotation updates per second; 0 disables throttling
    pub rotation_rate_limit: u32,
    pub sensor_change_threshold: f32,
    pub weapon: WeaponStats,
}

impl EngineSettings {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            auto_ready: false,
            rotation_rate_limit: 0,
            sensor_change_threshold: 0.0,
            weapon: WeaponStats::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            player_name: config.player_name.clone(),
            auto_ready: config.auto_ready,
            rotation_rate_limit: config.rotation_rate_limit,
            sensor_change_threshold: config.sensor_change_threshold,
            weapon: WeaponStats::default(),
        }
    }
}

/// Lobby handshake progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyState {
    /// Waiting for the server to ask for a name
    Connecting,
    /// Name sent, awaiting acceptance
    NameSent,
    /// Name accepted
    Named,
    /// In the matchmaking queue
    Queued,
    /// Paired with an opponent
    Matched { opponent: String },
}

/// Owns every piece of client state. All inputs funnel through `&mut self`,
/// so a single caller serializes timer, sensor and network writes.
#[derive(Debug)]
pub struct Engine {
    settings: EngineSettings,
    lobby: LobbyState,
    phase: MatchPhase,
    calibrator: OrientationCalibrator,
    game: Option<Game>,
    transport: TransportHandle,
    throttle: RotationThrottle,
    connected: bool,
    ready_sent: bool,
    /// Latest rotation the limiter held back
    unsent_rotation: Option<EulerAngles>,
    stopped: bool,
}

impl Engine {
    pub fn new(settings: EngineSettings, transport: TransportHandle) -> Self {
        let throttle = RotationThrottle::new(settings.rotation_rate_limit);
        let calibrator = OrientationCalibrator::new(settings.sensor_change_threshold);
        Self {
            settings,
            lobby: LobbyState::Connecting,
            phase: MatchPhase::AwaitingMatch,
            calibrator,
            game: None,
            transport,
            throttle,
            connected: false,
            ready_sent: false,
            unsent_rotation: None,
            stopped: false,
        }
    }

    // ------------------------------------------------------------------
    // Network
    // ------------------------------------------------------------------

    pub fn connection_established(&mut self) {
        info!(username = %self.settings.player_name, "Connected to server");
        self.connected = true;
    }

    /// Socket closed. An unfinished match ends as a disconnect.
    pub fn connection_lost(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        warn!("Connection to server lost");

        let name = self.settings.player_name.clone();
        if let Some(game) = self.game.as_mut() {
            if game.apply_game_over(GameOverReason::Disconnected(name)) {
                self.phase = MatchPhase::GameOver;
            }
        }
    }

    pub fn handle_server_message(&mut self, msg: ServerMessage) -> Result<(), EngineError> {
        if self.stopped {
            return Ok(());
        }
        debug!(kind = msg.kind(), "Server message");

        match msg {
            ServerMessage::AskName(prompt) => self.on_ask_name(&prompt)?,
            ServerMessage::Ready(text) => {
                info!(message = %text, "Name accepted");
                self.lobby = LobbyState::Named;
            }
            ServerMessage::Waiting(text) => {
                info!(message = %text, "Waiting for an opponent");
                self.lobby = LobbyState::Queued;
                self.phase = MatchPhase::AwaitingMatch;
            }
            ServerMessage::Matched(opponent) => self.on_matched(opponent),
            ServerMessage::GameStarted { players } => self.on_game_started(&players)?,
            other => {
                let game = self.game.as_mut().ok_or(crate::game::GameError::NoActiveMatch)?;
                let result = game.apply(&other);
                if game.is_game_over() {
                    self.phase = MatchPhase::GameOver;
                }
                self.flush_outbox();
                result?;
            }
        }
        Ok(())
    }

    fn on_ask_name(&mut self, prompt: &str) -> Result<(), EngineError> {
        if self.lobby != LobbyState::Connecting {
            self.stopped = true;
            return Err(EngineError::NameRejected(self.settings.player_name.clone()));
        }
        debug!(prompt = %prompt, "Server asked for a name");
        self.transport
            .send(ClientMessage::Name(self.settings.player_name.clone()));
        self.lobby = LobbyState::NameSent;
        Ok(())
    }

    fn on_matched(&mut self, opponent: String) {
        info!(opponent = %opponent, "Matched");
        self.lobby = LobbyState::Matched { opponent };
        self.phase = MatchPhase::ReadyPending;
        self.ready_sent = false;

        if self.settings.auto_ready {
            self.send_ready();
        }
    }

    fn on_game_started(&mut self, roster: &[crate::ws::protocol::PlayerData]) -> Result<(), EngineError> {
        let mut game = Game::with_weapon(roster, &self.settings.player_name, self.settings.weapon)?;
        let initial = game.local_player()?.initial_rotation();

        self.calibrator.set_initial_rotation(initial);
        if let Some(camera) = self.calibrator.recompute().camera {
            game.set_new_orientation(camera);
        }

        info!(
            players = ?game.players().iter().map(|p| p.username()).collect::<Vec<_>>(),
            "Game started"
        );
        self.game = Some(game);
        self.phase = MatchPhase::Playing;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Local input
    // ------------------------------------------------------------------

    pub fn handle_sensor_sample(&mut self, values: &[f32]) -> Result<(), EngineError> {
        if let Some(orientation) = self.calibrator.ingest(values)? {
            self.apply_orientation(orientation);
        }
        Ok(())
    }

    /// Zero the calibration at the current device orientation
    pub fn calibrate(&mut self) {
        info!("Calibrating orientation");
        let orientation = self.calibrator.calibrate();
        self.apply_orientation(orientation);
    }

    fn apply_orientation(&mut self, orientation: CalibratedOrientation) {
        if let (Some(game), Some(camera)) = (self.game.as_mut(), orientation.camera) {
            game.set_new_orientation(camera);
        }

        self.unsent_rotation = Some(orientation.rotation_update);
        self.flush_rotation();
    }

    /// Send the newest unsent rotation if the match is live and the limiter allows.
    /// A throttled rotation stays queued for the next attempt.
    fn flush_rotation(&mut self) {
        if !(self.connected && self.phase == MatchPhase::Playing) {
            self.unsent_rotation = None;
            return;
        }
        let Some(angles) = self.unsent_rotation else {
            return;
        };
        if !self.throttle.check() {
            return;
        }
        self.unsent_rotation = None;
        self.transport.send(ClientMessage::PlayerRotationUpdated {
            x: angles.roll,
            y: angles.pitch,
            z: angles.yaw,
        });
    }

    pub fn shoot(&mut self) -> Option<ShotOutcome> {
        let outcome = self.game.as_mut()?.shoot();
        self.flush_outbox();
        outcome
    }

    /// Tell the server we're ready to start
    pub fn request_ready(&mut self) -> Result<(), EngineError> {
        if !matches!(self.lobby, LobbyState::Matched { .. }) {
            return Err(EngineError::NotMatched);
        }
        self.send_ready();
        Ok(())
    }

    fn send_ready(&mut self) {
        if self.ready_sent {
            debug!("player_ready already sent");
            return;
        }
        self.ready_sent = self.transport.send(ClientMessage::PlayerReady {});
    }

    // ------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------

    pub fn clock_tick(&mut self, delta_ms: i64) {
        if let Some(game) = self.game.as_mut() {
            game.increase_time(delta_ms);
        }
        self.flush_rotation();
    }

    pub fn render_tick(&mut self) -> FrameSnapshot {
        match self.game.as_mut() {
            Some(game) => {
                game.render_tick();
                game.snapshot()
            }
            None => FrameSnapshot::empty(self.phase),
        }
    }

    fn flush_outbox(&mut self) {
        if let Some(game) = self.game.as_mut() {
            for msg in game.drain_outbox() {
                self.transport.send(msg);
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn lobby(&self) -> &LobbyState {
        &self.lobby
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Direct game access for hosts that position the camera themselves
    pub fn game_mut(&mut self) -> Option<&mut Game> {
        self.game.as_mut()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// True once the engine refuses further input
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
