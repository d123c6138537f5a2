//! Generic WebSocket message stream, split across a reader and a writer
//! task.

pub mod connection;
pub mod frame;
pub mod reader;
pub mod validator;
pub mod websocket;
pub mod writer;

mod message;

pub use self::connection::{ConnectionManager, ConnectionState, WebSocketConnection};
pub use self::frame::CloseFrame;
pub use self::message::Message;
pub use self::validator::ValidatorMode;
pub use self::websocket::{Role, WebSocket};

use crate::extensions::compression::WsCompression;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default limit on an assembled message, matching the historical
/// crate default: 64 MiB.
pub(crate) const MAX_MESSAGE_SIZE: usize = 64 << 20;

/// How long a reader that has requested a stop will wait for the peer's
/// close frame before the guard timer forces the socket shut.
pub(crate) const DEFAULT_CLOSE_DELAY: Duration = Duration::from_secs(5);

/// How often the writer flushes a run of data frames even absent an
/// explicit flush request.
pub(crate) const FLUSH_THRESHOLD: Duration = Duration::from_secs(1);

/// Configuration for a WebSocket connection.
///
/// Constructed with `WebSocketConfig::default()` and modified with struct
/// update syntax, mirroring [`crate::extensions::compression::deflate::DeflateConfig`].
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Target size of the write buffer to reach before writing the data
    /// to the underlying stream. The default value is 128 KiB.
    pub write_buffer_size: usize,
    /// The max size of the write buffer in bytes. Setting this value to 0
    /// disables the buffer guard.
    pub max_write_buffer_size: usize,
    /// The maximum size of a message. `None` means no size limit. The
    /// default value is 64 MiB, which should be reasonably big for
    /// all normal use cases but small enough to prevent memory
    /// eating by a malicious peer.
    pub max_message_size: Option<usize>,
    /// The maximum size of a single message frame. `None` means no size
    /// limit. The limit is for frame payload NOT including the frame
    /// header. The default value is 16 MiB.
    pub max_frame_size: Option<usize>,
    /// When set to `true`, the server will accept and handle unmasked
    /// frames from the client. According to the RFC 6455, the server
    /// must close the connection to the client in such cases, however
    /// it seems like there are some popular libraries that are sending
    /// unmasked frames, ignoring the RFC. By default this option is
    /// set to `false`, i.e. according to the RFC.
    pub accept_unmasked_frames: bool,
    /// Whether to use strict validation (RSV2/RSV3/opcode checks) or the
    /// extended, more permissive mode. Defaults to strict.
    pub validator_mode: ValidatorMode,
    /// How long the reader waits for the peer's close frame after it has
    /// sent its own, before a guard timer forcibly closes the socket.
    pub close_delay: Duration,
    /// Back-pressure bound on the outbound data-frame queue. Control
    /// frames (ping/pong/close) always bypass this bound. `None` means
    /// unbounded.
    pub outbound_queue_bound: Option<usize>,
    /// Whether the writer should flush after every queued data frame,
    /// rather than batching up to [`FLUSH_THRESHOLD`].
    pub auto_flush: bool,
    /// The permessage-deflate (or no-op) extension this connection will
    /// negotiate.
    pub compression: WsCompression,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        WebSocketConfig {
            write_buffer_size: 128 * 1024,
            max_write_buffer_size: usize::MAX,
            max_message_size: Some(MAX_MESSAGE_SIZE),
            max_frame_size: Some(16 << 20),
            accept_unmasked_frames: false,
            validator_mode: ValidatorMode::Strict,
            close_delay: DEFAULT_CLOSE_DELAY,
            outbound_queue_bound: None,
            auto_flush: false,
            compression: WsCompression::None(Some(MAX_MESSAGE_SIZE)),
        }
    }
}

/// A `Read + Write` stream wrapped in an `Arc<Mutex<_>>` so a single
/// underlying transport (one that can't otherwise be split into
/// independent read/write halves, e.g. a TLS stream) can be handed to a
/// reader task and a writer task separately.
///
/// This trades true half-duplex independence (the two tasks serialize on
/// the same lock) for being generic over any `Stream: Read + Write`; see
/// `DESIGN.md` for the rationale.
#[derive(Debug)]
pub(crate) struct SharedStream<S>(Arc<Mutex<S>>);

impl<S> SharedStream<S> {
    /// Split `stream` into two handles sharing the same underlying
    /// transport.
    pub(crate) fn split(stream: S) -> (SharedStream<S>, SharedStream<S>) {
        let shared = Arc::new(Mutex::new(stream));
        (SharedStream(Arc::clone(&shared)), SharedStream(shared))
    }
}

impl<S> Clone for SharedStream<S> {
    fn clone(&self) -> Self {
        SharedStream(Arc::clone(&self.0))
    }
}

impl<S: Read> Read for SharedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.lock().expect("shared stream mutex poisoned").read(buf)
    }
}

impl<S: Write> Write for SharedStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("shared stream mutex poisoned").write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().expect("shared stream mutex poisoned").flush()
    }
}
