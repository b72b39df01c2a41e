//! Headless input: line commands read from stdin

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::engine::EngineHandle;

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum InputCommand {
    /// Raw rotation-vector sample, 3 or 4 components
    Sensor(Vec<f32>),
    Calibrate,
    Shoot,
    Ready,
    Quit,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("sensor expects 3 or 4 numbers, got {0}")]
    SensorArity(usize),

    #[error("not a number: {0}")]
    BadNumber(String),
}

pub fn parse_command(line: &str) -> Result<InputCommand, InputError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err(InputError::Empty);
    };

    match command.to_ascii_lowercase().as_str() {
        "sensor" => {
            let values = words
                .map(|w| w.parse::<f32>().map_err(|_| InputError::BadNumber(w.to_string())))
                .collect::<Result<Vec<_>, _>>()?;
            if !(3..=4).contains(&values.len()) {
                return Err(InputError::SensorArity(values.len()));
            }
            Ok(InputCommand::Sensor(values))
        }
        "calibrate" => Ok(InputCommand::Calibrate),
        "shoot" => Ok(InputCommand::Shoot),
        "ready" => Ok(InputCommand::Ready),
        "quit" | "exit" => Ok(InputCommand::Quit),
        other => Err(InputError::Unknown(other.to_string())),
    }
}

/// Feed stdin lines to the engine until EOF or `quit`
pub async fn run_stdin(engine: EngineHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let delivered = match parse_command(&line) {
            Ok(InputCommand::Sensor(values)) => engine.submit_sensor_sample(values),
            Ok(InputCommand::Calibrate) => engine.calibrate().await,
            Ok(InputCommand::Shoot) => engine.shoot().await,
            Ok(InputCommand::Ready) => engine.ready().await,
            Ok(InputCommand::Quit) => {
                info!("Quit requested");
                engine.shutdown().await;
                return;
            }
            Err(e) => {
                warn!(error = %e, "Ignoring input line");
                continue;
            }
        };

        if !delivered && engine.is_closed() {
            break;
        }
    }

    info!("Input closed");
}
