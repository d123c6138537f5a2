use crate::protocol::frame::coding::Data;
use http::HeaderName;
use std::fmt;

/// Sub-protocol negotiation failures (`Sec-WebSocket-Protocol`).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SubProtocolError {
    /// The client requested one or more subprotocols but the server's
    /// response didn't include one.
    NoSubProtocol,
    /// The server's response included a subprotocol but the client never
    /// offered one.
    ServerSentSubProtocolNoneRequested,
    /// The server's response named a subprotocol the client never offered.
    InvalidSubProtocol,
}

impl fmt::Display for SubProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSubProtocol => write!(f, "no subprotocol was returned by the server"),
            Self::ServerSentSubProtocolNoneRequested => {
                write!(f, "server returned a subprotocol but none was requested")
            }
            Self::InvalidSubProtocol => {
                write!(f, "server returned a subprotocol that was not requested")
            }
        }
    }
}

impl std::error::Error for SubProtocolError {}

/// Indicates the specific type/cause of a protocol error.
#[derive(PartialEq, Eq, Clone)]
pub enum ProtocolError {
    /// A header name or value failed to parse.
    InvalidHeader(HeaderName),
    /// Subprotocol negotiation (`Sec-WebSocket-Protocol`) failed.
    SecWebSocketSubProtocolError(SubProtocolError),
    /// Use of the wrong HTTP method (the WebSocket protocol requires the GET method be used).
    WrongHttpMethod,
    /// Wrong HTTP version used (the WebSocket protocol requires version 1.1 or higher).
    WrongHttpVersion,
    /// Missing `Connection: upgrade` HTTP header.
    MissingConnectionUpgradeHeader,
    /// Missing `Upgrade: websocket` HTTP header.
    MissingUpgradeWebSocketHeader,
    /// Missing `Sec-WebSocket-Version: 13` HTTP header.
    MissingSecWebSocketVersionHeader,
    /// Missing `Sec-WebSocket-Key` HTTP header.
    MissingSecWebSocketKey,
    /// The `Sec-WebSocket-Accept` header is either not present or does not specify the correct key value.
    SecWebSocketAcceptKeyMismatch,
    /// Garbage data encountered after client request.
    JunkAfterRequest,
    /// Custom responses must be unsuccessful.
    CustomResponseSuccessful,
    /// No more data while still performing handshake.
    HandshakeIncomplete,
    /// Wrapper around a [`httparse::Error`] value.
    HttparseError(httparse::Error),
    /// Not allowed to send after having sent a closing frame.
    SendAfterClosing,
    /// Remote sent data after sending a closing frame.
    ReceivedAfterClosing,
    /// Reserved bits in frame header are non-zero.
    NonZeroReservedBits,
    /// The server must close the connection when an unmasked frame is received.
    UnmaskedFrameFromClient,
    /// The client must close the connection when a masked frame is received.
    MaskedFrameFromServer,
    /// Control frames must not be fragmented.
    FragmentedControlFrame,
    /// Control frames must have a payload of 125 bytes or less.
    ControlFrameTooBig,
    /// Type of control frame not recognised.
    UnknownControlFrameType(u8),
    /// Type of data frame not recognised.
    UnknownDataFrameType(u8),
    /// Received a continue frame despite there being nothing to continue.
    UnexpectedContinueFrame,
    /// Received data while waiting for more fragments.
    ExpectedFragment(Data),
    /// Connection closed without performing the closing handshake.
    ResetWithoutClosingHandshake,
    /// Encountered an invalid opcode.
    InvalidOpcode(u8),
    /// The payload for the closing frame is invalid.
    InvalidCloseSequence,
    /// A reserved bit other than RSV1 (or RSV1 with no active extension) was set.
    UnexpectedReservedBit,
    /// The frame's opcode is not one RFC 6455 defines.
    UnknownOpcode,
    /// A frame meant to travel client-to-server arrived unmasked, or vice versa.
    FrameMasked,
    /// A continuation frame arrived with no fragmented message in progress.
    UnexpectedContinuationFrame,
    /// A text or binary frame arrived while a fragmented message was still open.
    ContinuationNotClosed,
    /// Not enough bytes were available to parse a complete frame header.
    InsufficientData,
    /// The frame declared a payload length DEFLATE/RFC 6455 do not allow.
    InvalidPayloadLength,
    /// The underlying stream ended with no further frame to read.
    NoMoreFrame,
    /// The frame's payload exceeds the configured maximum message size.
    TooLongPayload,
    /// A control frame's payload exceeds the 125-byte limit RFC 6455 §5.5 sets.
    TooLongControlFramePayload,
    /// Allocating space for an incoming payload failed.
    InsufficientMemory,
    /// Decompressing a permessage-deflate payload failed.
    DecompressionError,
    /// A Huffman code could not be resolved against any known canonical code.
    BadCode,
    /// A DEFLATE block declared BTYPE=11, which RFC 1951 reserves.
    BadBlockType,
}

impl fmt::Debug for ProtocolError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHeader(name) => write!(f, "invalid header: {}", name),
            Self::SecWebSocketSubProtocolError(e) => write!(f, "{}", e),
            Self::WrongHttpMethod => {
                write!(f, "Unsupported HTTP method used - only GET is allowed")
            }
            Self::WrongHttpVersion => write!(f, "HTTP version must be 1.1 or higher"),
            Self::MissingConnectionUpgradeHeader => write!(f, "No \"Connection: upgrade\" header"),
            Self::MissingUpgradeWebSocketHeader => write!(f, "No \"Upgrade: websocket\" header"),
            Self::MissingSecWebSocketVersionHeader => {
                write!(f, "No \"Sec-WebSocket-Version: 13\" header")
            }
            Self::MissingSecWebSocketKey => write!(f, "No \"Sec-WebSocket-Key\" header"),
            Self::SecWebSocketAcceptKeyMismatch => {
                write!(f, "Key mismatch in \"Sec-WebSocket-Accept\" header")
            }
            Self::JunkAfterRequest => write!(f, "Junk after client request"),
            Self::CustomResponseSuccessful => write!(f, "Custom response must not be successful"),
            Self::HandshakeIncomplete => write!(f, "Handshake not finished"),
            Self::HttparseError(elem) => write!(f, "httparse error: {}", elem),
            Self::SendAfterClosing => write!(f, "Sending after closing is not allowed"),
            Self::ReceivedAfterClosing => write!(f, "Remote sent after having closed"),
            Self::NonZeroReservedBits => write!(f, "Reserved bits are non-zero"),
            Self::UnmaskedFrameFromClient => write!(f, "Received an unmasked frame from client"),
            Self::MaskedFrameFromServer => write!(f, "Received a masked frame from server"),
            Self::FragmentedControlFrame => write!(f, "Fragmented control frame"),
            Self::ControlFrameTooBig => {
                write!(f, "Control frame too big (payload must be 125 bytes or less)")
            }
            Self::UnknownControlFrameType(elem) => {
                write!(f, "Unknown control frame type: {}", elem)
            }
            Self::UnknownDataFrameType(elem) => write!(f, "Unknown data frame type: {}", elem),
            Self::UnexpectedContinueFrame => write!(f, "Continue frame but nothing to continue"),
            Self::ExpectedFragment(elem) => {
                write!(f, "While waiting for more fragments received: {}", elem)
            }
            Self::ResetWithoutClosingHandshake => {
                write!(f, "Connection reset without closing handshake")
            }
            Self::InvalidOpcode(elem) => write!(f, "Encountered invalid opcode: {}", elem),
            Self::InvalidCloseSequence => write!(f, "Invalid close sequence"),
            Self::UnexpectedReservedBit => write!(f, "Unexpected non-zero reserved bit"),
            Self::UnknownOpcode => write!(f, "Unknown opcode"),
            Self::FrameMasked => write!(f, "Frame had unexpected masking"),
            Self::UnexpectedContinuationFrame => {
                write!(f, "Continuation frame with nothing to continue")
            }
            Self::ContinuationNotClosed => {
                write!(f, "Received a new message while a fragmented one was open")
            }
            Self::InsufficientData => write!(f, "Not enough data to parse a frame"),
            Self::InvalidPayloadLength => write!(f, "Invalid payload length"),
            Self::NoMoreFrame => write!(f, "No more frames to read"),
            Self::TooLongPayload => write!(f, "Payload exceeds the maximum message size"),
            Self::TooLongControlFramePayload => {
                write!(f, "Control frame payload exceeds 125 bytes")
            }
            Self::InsufficientMemory => write!(f, "Could not allocate space for payload"),
            Self::DecompressionError => write!(f, "Decompression failed"),
            Self::BadCode => write!(f, "Invalid Huffman code"),
            Self::BadBlockType => write!(f, "Invalid DEFLATE block type"),
        }
    }
}

impl fmt::Display for ProtocolError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for ProtocolError {}
