//! Engine task and the handle other tasks use to reach it

use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::game::{FrameSnapshot, MatchPhase};
use crate::util::time::{tick_period, Timer, DEFAULT_CLOCK_TICK_MS, DEFAULT_RENDER_TPS};
use crate::ws::protocol::ServerMessage;

use super::{Engine, EngineError};

/// Command queue depth; sensor samples beyond this are dropped
const COMMAND_BUFFER: usize = 256;
/// How often frame statistics are logged (ms)
const FRAME_STATS_INTERVAL_MS: u64 = 5_000;

/// Clock and render cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRates {
    pub clock_tick_ms: u64,
    pub render_tps: u32,
}

impl TickRates {
    pub fn from_config(config: &Config) -> Self {
        Self {
            clock_tick_ms: config.clock_tick_ms,
            render_tps: config.render_tps,
        }
    }
}

impl Default for TickRates {
    fn default() -> Self {
        Self {
            clock_tick_ms: DEFAULT_CLOCK_TICK_MS,
            render_tps: DEFAULT_RENDER_TPS,
        }
    }
}

/// Inputs accepted by the engine task
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Connected,
    Server(ServerMessage),
    Sensor(Vec<f32>),
    Calibrate,
    Shoot,
    Ready,
    ConnectionLost,
    Shutdown,
}

/// Cloneable handle to a running engine
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
    frame: Arc<RwLock<FrameSnapshot>>,
}

impl EngineHandle {
    async fn send(&self, cmd: EngineCommand) -> bool {
        self.tx.send(cmd).await.is_ok()
    }

    pub async fn connection_established(&self) -> bool {
        self.send(EngineCommand::Connected).await
    }

    pub async fn send_server_message(&self, msg: ServerMessage) -> bool {
        self.send(EngineCommand::Server(msg)).await
    }

    /// Never waits: a full queue drops the sample, the next one supersedes it
    pub fn submit_sensor_sample(&self, values: Vec<f32>) -> bool {
        match self.tx.try_send(EngineCommand::Sensor(values)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Engine queue full, dropping sensor sample");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub async fn calibrate(&self) -> bool {
        self.send(EngineCommand::Calibrate).await
    }

    pub async fn shoot(&self) -> bool {
        self.send(EngineCommand::Shoot).await
    }

    pub async fn ready(&self) -> bool {
        self.send(EngineCommand::Ready).await
    }

    pub async fn connection_lost(&self) -> bool {
        self.send(EngineCommand::ConnectionLost).await
    }

    pub async fn shutdown(&self) -> bool {
        self.send(EngineCommand::Shutdown).await
    }

    /// Most recent frame published by the render tick
    pub fn latest_frame(&self) -> FrameSnapshot {
        self.frame.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runs an [`Engine`] on a single task
pub struct EngineTask {
    engine: Engine,
    rx: mpsc::Receiver<EngineCommand>,
    frame: Arc<RwLock<FrameSnapshot>>,
    rates: TickRates,
}

impl EngineTask {
    pub fn new(engine: Engine, rates: TickRates) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let frame = Arc::new(RwLock::new(FrameSnapshot::empty(engine.phase())));

        let handle = EngineHandle {
            tx,
            frame: frame.clone(),
        };
        let task = Self {
            engine,
            rx,
            frame,
            rates,
        };
        (task, handle)
    }

    /// Run until shutdown, all handles dropped, or a fatal lobby error
    pub async fn run(mut self) -> Result<(), EngineError> {
        info!(
            clock_tick_ms = self.rates.clock_tick_ms,
            render_tps = self.rates.render_tps,
            "Engine started"
        );

        let mut clock = interval(std::time::Duration::from_millis(self.rates.clock_tick_ms.max(1)));
        let mut render = interval(tick_period(self.rates.render_tps));
        render.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let clock_delta = self.rates.clock_tick_ms as i64;
        let mut stats_timer = Timer::new();
        let mut frames: u64 = 0;
        let mut last_phase = self.engine.phase();

        loop {
            tokio::select! {
                cmd = self.rx.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("All engine handles dropped");
                        break;
                    };
                    if matches!(cmd, EngineCommand::Shutdown) {
                        info!("Engine shutdown requested");
                        break;
                    }
                    self.handle_command(cmd)?;
                }
                _ = clock.tick() => {
                    self.engine.clock_tick(clock_delta);
                }
                _ = render.tick() => {
                    let frame = self.engine.render_tick();
                    *self.frame.write() = frame;
                    frames += 1;

                    if stats_timer.elapsed_ms() >= FRAME_STATS_INTERVAL_MS {
                        debug!(frames, elapsed_ms = stats_timer.elapsed_ms(), "Render stats");
                        frames = 0;
                        stats_timer.reset();
                    }
                }
            }

            let phase = self.engine.phase();
            if phase != last_phase {
                info!(from = ?last_phase, to = ?phase, "Match phase changed");
                last_phase = phase;
                if phase == MatchPhase::GameOver {
                    *self.frame.write() = self.engine.render_tick();
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    fn handle_command(&mut self, cmd: EngineCommand) -> Result<(), EngineError> {
        let result = match cmd {
            EngineCommand::Connected => {
                self.engine.connection_established();
                Ok(())
            }
            EngineCommand::Server(msg) => self.engine.handle_server_message(msg),
            EngineCommand::Sensor(values) => self.engine.handle_sensor_sample(&values),
            EngineCommand::Calibrate => {
                self.engine.calibrate();
                Ok(())
            }
            EngineCommand::Shoot => {
                if self.engine.shoot().is_none() {
                    debug!("Shot ignored");
                }
                Ok(())
            }
            EngineCommand::Ready => self.engine.request_ready(),
            EngineCommand::ConnectionLost => {
                self.engine.connection_lost();
                Ok(())
            }
            EngineCommand::Shutdown => Ok(()),
        };

        match result {
            Err(EngineError::NameRejected(name)) => {
                error!(username = %name, "Name rejected by server");
                Err(EngineError::NameRejected(name))
            }
            Err(e) => {
                warn!(error = %e, "Engine input rejected");
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}

/// Why the client stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Engine ended on its own (quit, rejected name)
    EngineExited,
    /// Server session closed
    SessionEnded,
    /// External shutdown request
    Signal,
}

/// Wait for the engine, the server session or `shutdown`, whichever finishes
/// first. The engine is then stopped and has published its last frame.
pub async fn supervise<F>(
    mut engine_task: JoinHandle<Result<(), EngineError>>,
    mut session: JoinHandle<()>,
    handle: &EngineHandle,
    shutdown: F,
) -> Result<StopReason, EngineError>
where
    F: Future<Output = ()>,
{
    let reason = tokio::select! {
        result = &mut engine_task => {
            session.abort();
            result??;
            return Ok(StopReason::EngineExited);
        }
        _ = &mut session => StopReason::SessionEnded,
        _ = shutdown => StopReason::Signal,
    };

    info!(reason = ?reason, "Stopping engine");
    handle.shutdown().await;
    session.abort();
    engine_task.await??;
    Ok(reason)
}
