//! Lightball headless client
//!
//! Connects to the game server, feeds stdin commands (sensor samples,
//! calibrate, shoot, ready) into the engine and renders frames at a fixed rate.

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lightball_client::config::Config;
use lightball_client::engine::{supervise, Engine, EngineSettings, EngineTask, TickRates};
use lightball_client::input::run_stdin;
use lightball_client::ws::{run_session, TransportHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);

    info!("Starting Lightball client");
    info!(server = %config.server_url, player = %config.player_name, "Configuration loaded");

    let (transport, outbound_rx) = TransportHandle::channel();
    let engine = Engine::new(EngineSettings::from_config(&config), transport);
    let (task, handle) = EngineTask::new(engine, TickRates::from_config(&config));

    let engine_task = tokio::spawn(task.run());

    let session_handle = handle.clone();
    let server_url = config.server_url.clone();
    let session = tokio::spawn(async move {
        if let Err(e) = run_session(&server_url, session_handle, outbound_rx).await {
            error!(error = %e, "Session failed");
        }
    });

    tokio::spawn(run_stdin(handle.clone()));

    let reason = supervise(engine_task, session, &handle, shutdown_signal()).await?;
    info!(reason = ?reason, "Client stopping");

    let frame = handle.latest_frame();
    if let Some(reason) = frame.game_over {
        info!(reason = %reason, "Final result");
    }

    info!("Client shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Ctrl+C / SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
