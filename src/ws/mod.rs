//! Server connection: wire protocol, outbound channel and socket session

pub mod client;
pub mod protocol;
pub mod transport;

pub use client::{run_session, TransportError};
pub use protocol::{parse_server_message, ClientMessage, ProtocolError, ServerMessage};
pub use transport::TransportHandle;
