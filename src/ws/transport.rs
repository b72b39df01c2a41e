//! Outbound message channel between the engine and the socket writer

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::protocol::ClientMessage;

/// Fire-and-forget sender for client messages.
///
/// Sending never blocks the engine; once the socket is gone messages are
/// dropped with a log line.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl TransportHandle {
    /// Create a handle plus the receiver the socket writer drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a message; returns false if the writer has gone away
    pub fn send(&self, msg: ClientMessage) -> bool {
        let kind = msg.kind();
        match self.tx.send(msg) {
            Ok(()) => {
                debug!(kind, "Queued outbound message");
                true
            }
            Err(_) => {
                warn!(kind, "Transport closed, dropping outbound message");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
