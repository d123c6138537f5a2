//! The synchronous handshake result: a frame-level socket plus enough
//! context (role, negotiated config, and any bytes read past the HTTP
//! response/request) to hand off to [`super::connection::ConnectionManager`].

use crate::protocol::frame::FrameSocket;
use crate::protocol::WebSocketConfig;

/// Indicates a Client or Server role of the websocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// This socket is a client.
    Client,
}

/// The direct output of a completed handshake.
///
/// This is a thin wrapper, not a usable read/write API by itself: callers
/// hand it to [`super::connection::ConnectionManager::from_handshake`],
/// which splits the stream and spawns the reader/writer tasks the rest of
/// this crate's public API is built on.
#[derive(Debug)]
pub struct WebSocket<Stream> {
    role: Role,
    socket: FrameSocket<Stream>,
    config: WebSocketConfig,
}

impl<Stream> WebSocket<Stream> {
    /// Convert a raw socket into a WebSocket without performing a handshake.
    pub fn from_raw_socket(stream: Stream, role: Role, config: Option<WebSocketConfig>) -> Self {
        WebSocket { role, socket: FrameSocket::new(stream), config: config.unwrap_or_default() }
    }

    /// Convert a raw socket plus already-buffered trailing bytes (read past
    /// the HTTP handshake) into a WebSocket without performing a handshake.
    pub fn from_partially_read(
        stream: Stream,
        part: Vec<u8>,
        role: Role,
        config: Option<WebSocketConfig>,
    ) -> Self {
        WebSocket {
            role,
            socket: FrameSocket::from_partially_read(stream, part),
            config: config.unwrap_or_default(),
        }
    }

    /// Returns a shared reference to the inner stream.
    pub fn get_ref(&self) -> &Stream {
        self.socket.get_ref()
    }

    /// Returns a mutable reference to the inner stream.
    pub fn get_mut(&mut self) -> &mut Stream {
        self.socket.get_mut()
    }

    /// Which role (client or server) this socket negotiated as.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The negotiated configuration.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Decompose into the raw stream, any bytes already read past the
    /// handshake, and the negotiated configuration.
    pub fn into_parts(self) -> (Stream, Vec<u8>, WebSocketConfig) {
        let (stream, tail) = self.socket.into_inner();
        (stream, tail, self.config)
    }
}
