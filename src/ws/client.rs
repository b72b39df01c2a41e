//! WebSocket session: socket frames in and out of the engine

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::engine::EngineHandle;

use super::protocol::{parse_server_message, ClientMessage};

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Engine stopped before the session ended")]
    EngineClosed,
}

/// Connect to `url` and pump frames until either side closes.
///
/// Inbound text frames that fail to parse are logged and skipped. The engine
/// is told about the disconnect however the session ends.
pub async fn run_session(
    url: &str,
    engine: EngineHandle,
    mut outbound_rx: mpsc::UnboundedReceiver<ClientMessage>,
) -> Result<(), TransportError> {
    info!(url = %url, "Connecting");
    let (socket, _response) = connect_async(url).await?;
    let (mut ws_sink, mut ws_stream) = socket.split();

    engine.connection_established().await;

    // Writer task: engine outbox -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match msg.to_wire() {
                Ok(text) => text,
                Err(e) => {
                    error!(kind = msg.kind(), error = %e, "Failed to encode client message");
                    continue;
                }
            };
            if let Err(e) = ws_sink.send(Message::Text(text)).await {
                debug!(error = %e, "WebSocket send failed");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    // Reader loop: WebSocket -> engine
    let mut result = Ok(());
    while let Some(frame) = ws_stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match parse_server_message(&text) {
                Ok(msg) => {
                    if !engine.send_server_message(msg).await {
                        result = Err(TransportError::EngineClosed);
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Dropping unparseable server message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!("Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
            Ok(Message::Close(frame)) => {
                info!(frame = ?frame, "Server closed connection");
                break;
            }
            Err(e) => {
                error!(error = %e, "WebSocket error");
                result = Err(TransportError::WebSocket(e));
                break;
            }
        }
    }

    engine.connection_lost().await;
    writer_handle.abort();

    info!("Session ended");
    result
}
