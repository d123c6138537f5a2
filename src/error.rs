//! Error handling.

mod capacity_error;
mod protocol_error;
mod tls_error;
mod url_error;

use crate::protocol::frame::coding::CloseCode;
use crate::protocol::Message;
pub use capacity_error::CapacityError;
use http::Response;
pub use protocol_error::{ProtocolError, SubProtocolError};
use std::borrow::Cow;
use std::{fmt, io, result, str, string};
pub use tls_error::TlsError;
pub use url_error::UrlError;

/// Result type of all Tungstenite library calls.
pub type Result<T, E = Error> = result::Result<T, E>;

/// Possible WebSocket errors.
pub enum Error {
    /// WebSocket connection closed normally. This informs you of the close.
    /// It's not an error as such and nothing wrong happened.
    ///
    /// This is returned as soon as the close handshake is finished (we have both sent and
    /// received a close frame) on the server end and as soon as the server has closed the
    /// underlying connection if this endpoint is a client.
    ///
    /// Thus when you receive this, it is safe to drop the underlying connection.
    ///
    /// Receiving this error means that the WebSocket object is not usable anymore and the
    /// only meaningful action with it is dropping it.
    ConnectionClosed,
    /// Trying to work with already closed connection.
    ///
    /// Trying to read or write after receiving `ConnectionClosed` causes this.
    ///
    /// As opposed to `ConnectionClosed`, this indicates your code tries to operate on the
    /// connection when it really shouldn't anymore, so this really indicates a programmer
    /// error on your part.
    AlreadyClosed,
    /// Input-output error. Apart from WouldBlock, these are generally errors with the
    /// underlying connection and you should probably consider them fatal.
    Io(io::Error),
    /// TLS error.
    ///
    /// Note that this error variant is enabled unconditionally even if no TLS feature is enabled,
    /// to provide a feature-agnostic API surface.
    Tls(TlsError),
    /// - When reading: buffer capacity exhausted.
    /// - When writing: your message is bigger than the configured max message size
    ///   (64MB by default).
    Capacity(CapacityError),
    /// Protocol violation.
    Protocol(ProtocolError),
    /// Message send queue full.
    SendQueueFull(Message),
    /// The outbound frame buffer would exceed its configured bound.
    WriteBufferFull(Message),
    /// UTF coding error.
    Utf8,
    /// Invalid URL.
    Url(UrlError),
    /// HTTP error.
    Http(Response<Option<String>>),
    /// HTTP format error.
    HttpFormat(http::Error),
    /// An extension (currently: permessage-deflate) failed to negotiate or
    /// process a frame.
    ExtensionError(Cow<'static, str>),
    /// `connect()` was called on a connection that isn't in the `CREATED` state.
    NotInCreatedState,
    /// A blocking read was interrupted while waiting for more data.
    InterruptedInReading,
    /// An I/O error occurred specifically while reading frames.
    IoErrorInReading(io::Error),
    /// An I/O error occurred specifically while writing frames.
    IoErrorInWriting(io::Error),
    /// Flushing the outbound stream failed.
    FlushError(io::Error),
    /// A user-supplied state-change callback panicked or returned an error.
    UnexpectedError(Cow<'static, str>),
    /// The peer sent data at a rate or in packet sizes consistent with a
    /// denial-of-service attempt during the handshake.
    AttackAttempt,
}

/// Maps an error to the close code a conforming endpoint reports it with,
/// per RFC 6455 §7.4 and the extensions this crate adds on top of it.
pub fn close_code_for_error(err: &Error) -> CloseCode {
    match err {
        Error::Protocol(p) => match p {
            ProtocolError::NonZeroReservedBits
            | ProtocolError::UnexpectedReservedBit
            | ProtocolError::UnknownOpcode
            | ProtocolError::InvalidOpcode(_)
            | ProtocolError::UnknownControlFrameType(_)
            | ProtocolError::UnknownDataFrameType(_)
            | ProtocolError::FrameMasked
            | ProtocolError::UnmaskedFrameFromClient
            | ProtocolError::MaskedFrameFromServer
            | ProtocolError::FragmentedControlFrame
            | ProtocolError::UnexpectedContinueFrame
            | ProtocolError::UnexpectedContinuationFrame
            | ProtocolError::ContinuationNotClosed
            | ProtocolError::InsufficientData
            | ProtocolError::InvalidPayloadLength
            | ProtocolError::InvalidCloseSequence => CloseCode::Protocol,
            ProtocolError::TooLongPayload
            | ProtocolError::TooLongControlFramePayload
            | ProtocolError::ControlFrameTooBig
            | ProtocolError::InsufficientMemory => CloseCode::Size,
            ProtocolError::DecompressionError => CloseCode::Unsupported,
            _ => CloseCode::Protocol,
        },
        Error::Capacity(_) => CloseCode::Size,
        Error::ExtensionError(_) => CloseCode::Extension,
        Error::InterruptedInReading
        | Error::IoErrorInReading(_)
        | Error::IoErrorInWriting(_)
        | Error::FlushError(_) => CloseCode::Policy,
        _ => CloseCode::Error,
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(from: io::Error) -> Self {
        Self::Io(from)
    }
}

impl From<TlsError> for Error {
    #[inline]
    fn from(from: TlsError) -> Self {
        Self::Tls(from)
    }
}

impl From<CapacityError> for Error {
    #[inline]
    fn from(from: CapacityError) -> Self {
        Self::Capacity(from)
    }
}

impl From<ProtocolError> for Error {
    #[inline]
    fn from(from: ProtocolError) -> Self {
        Self::Protocol(from)
    }
}

impl From<Message> for Error {
    #[inline]
    fn from(from: Message) -> Self {
        Self::SendQueueFull(from)
    }
}

impl From<UrlError> for Error {
    #[inline]
    fn from(from: UrlError) -> Self {
        Self::Url(from)
    }
}

impl From<Response<Option<String>>> for Error {
    #[inline]
    fn from(from: Response<Option<String>>) -> Self {
        Self::Http(from)
    }
}

impl From<http::Error> for Error {
    #[inline]
    fn from(from: http::Error) -> Self {
        Self::HttpFormat(from)
    }
}

impl From<str::Utf8Error> for Error {
    fn from(_: str::Utf8Error) -> Self {
        Error::Utf8
    }
}

impl From<string::FromUtf8Error> for Error {
    fn from(_: string::FromUtf8Error) -> Self {
        Error::Utf8
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::HttpFormat(err.into())
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Error::HttpFormat(err.into())
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(_: http::header::ToStrError) -> Self {
        Error::Utf8
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Error::HttpFormat(err.into())
    }
}

impl From<http::status::InvalidStatusCode> for Error {
    fn from(err: http::status::InvalidStatusCode) -> Self {
        Error::HttpFormat(err.into())
    }
}

impl From<httparse::Error> for Error {
    fn from(err: httparse::Error) -> Self {
        match err {
            httparse::Error::TooManyHeaders => Error::Capacity(CapacityError::TooManyHeaders),
            e => Error::Protocol(ProtocolError::HttparseError(e)),
        }
    }
}

impl fmt::Debug for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ConnectionClosed => write!(f, "Connection closed normally"),
            Self::AlreadyClosed => write!(f, "Trying to work with closed connection"),
            Self::Io(ref elem) => write!(f, "IO error: {}", elem),
            Self::Tls(ref elem) => write!(f, "TLS error: {}", elem),
            Self::Capacity(ref elem) => write!(f, "Space limit exceeded: {}", elem),
            Self::Protocol(ref elem) => write!(f, "WebSocket protocol error: {}", elem),
            Self::SendQueueFull(ref elem) => write!(f, "Send queue is full: {}", elem),
            Self::WriteBufferFull(ref elem) => write!(f, "Write buffer is full: {}", elem),
            Self::Utf8 => write!(f, "UTF-8 encoding error"),
            Self::Url(ref elem) => write!(f, "URL error: {}", elem),
            Self::Http(ref elem) => write!(f, "HTTP error: {:?}", elem),
            Self::HttpFormat(ref elem) => write!(f, "HTTP format error: {}", elem),
            Self::ExtensionError(ref elem) => write!(f, "Extension error: {}", elem),
            Self::NotInCreatedState => {
                write!(f, "connect() called outside of the CREATED state")
            }
            Self::InterruptedInReading => write!(f, "Interrupted while reading"),
            Self::IoErrorInReading(ref elem) => write!(f, "IO error while reading: {}", elem),
            Self::IoErrorInWriting(ref elem) => write!(f, "IO error while writing: {}", elem),
            Self::FlushError(ref elem) => write!(f, "Failed to flush: {}", elem),
            Self::UnexpectedError(ref elem) => write!(f, "Unexpected error: {}", elem),
            Self::AttackAttempt => write!(f, "Detected possible attack during handshake"),
        }
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for Error {}
