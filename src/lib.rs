//! Lightweight, flexible WebSockets for Rust, blocking-client flavor.
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_must_use,
    unused_mut,
    unused_imports,
    unused_import_braces
)]

#[macro_use]
extern crate log;

pub mod buffer;
pub mod client;
pub mod error;
pub mod extensions;
pub mod handshake;
pub mod protocol;
pub mod proxy;
pub mod stream;
pub mod tls;
pub mod util;

mod deflate;
mod inflate;

pub use crate::client::{client, connect, IntoClientRequest};
pub use crate::error::{Error, Result};
pub use crate::handshake::client::ClientHandshake;
pub use crate::handshake::HandshakeError;
pub use crate::protocol::{
    CloseFrame, ConnectionManager, ConnectionState, Message, Role, WebSocket, WebSocketConfig,
    WebSocketConnection,
};

/// A buffer sized for frame header and handshake reads.
pub(crate) type ReadBuffer = buffer::ReadBuffer<4096>;
