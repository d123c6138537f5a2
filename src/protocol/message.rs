//! The value a caller sends and receives: a complete WebSocket message.

use crate::error::{CapacityError, Error, Result};
use crate::protocol::frame::{CloseFrame, Frame, Utf8Bytes};
use bytes::Bytes;
use std::fmt;

/// An enum representing the various forms of a WebSocket message.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Message {
    /// A text WebSocket message.
    Text(Utf8Bytes),
    /// A binary WebSocket message.
    Binary(Bytes),
    /// A ping message with the specified payload. Automatically answered with
    /// a matching pong if received while a connection is open.
    Ping(Bytes),
    /// A pong message with the specified payload, usually sent in response
    /// to a ping.
    Pong(Bytes),
    /// A close message with the optional close frame.
    Close(Option<CloseFrame>),
    /// A raw frame, used when the caller needs to queue something that isn't
    /// one of the above (notably: for [`Error::WriteBufferFull`] to hand a
    /// dropped frame back without losing it).
    Frame(Frame),
}

impl Message {
    /// Create a new text WebSocket message from a stringable.
    pub fn text<S>(string: S) -> Message
    where
        S: Into<Utf8Bytes>,
    {
        Message::Text(string.into())
    }

    /// Create a new binary WebSocket message by converting to `Bytes`.
    pub fn binary<B>(bin: B) -> Message
    where
        B: Into<Bytes>,
    {
        Message::Binary(bin.into())
    }

    /// Indicates whether a message is a text message.
    pub fn is_text(&self) -> bool {
        matches!(self, Message::Text(_))
    }

    /// Indicates whether a message is a binary message.
    pub fn is_binary(&self) -> bool {
        matches!(self, Message::Binary(_))
    }

    /// Indicates whether a message is a ping message.
    pub fn is_ping(&self) -> bool {
        matches!(self, Message::Ping(_))
    }

    /// Indicates whether a message is a pong message.
    pub fn is_pong(&self) -> bool {
        matches!(self, Message::Pong(_))
    }

    /// Indicates whether a message is a close message.
    pub fn is_close(&self) -> bool {
        matches!(self, Message::Close(_))
    }

    /// Get the length of the WebSocket message.
    pub fn len(&self) -> usize {
        match self {
            Message::Text(string) => string.len(),
            Message::Binary(data) | Message::Ping(data) | Message::Pong(data) => data.len(),
            Message::Close(None) => 0,
            Message::Close(Some(frame)) => 2 + frame.reason.len(),
            Message::Frame(frame) => frame.len(),
        }
    }

    /// Returns true if the WebSocket message has no content.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the message and return it as binary data.
    pub fn into_data(self) -> Bytes {
        match self {
            Message::Text(string) => Bytes::from(string),
            Message::Binary(data) | Message::Ping(data) | Message::Pong(data) => data,
            Message::Close(None) => Bytes::new(),
            Message::Close(Some(frame)) => {
                let mut data = Vec::with_capacity(2 + frame.reason.len());
                data.extend(u16::from(frame.code).to_be_bytes());
                data.extend_from_slice(frame.reason.as_bytes());
                data.into()
            }
            Message::Frame(frame) => frame.into_payload(),
        }
    }

    /// Attempt to consume the WebSocket message and convert it to text.
    pub fn into_text(self) -> Result<Utf8Bytes> {
        match self {
            Message::Text(string) => Ok(string),
            _ => Ok(Utf8Bytes::try_from(self.into_data())?),
        }
    }

    /// Attempt to get a `&str` from the WebSocket message, converting binary
    /// data to UTF-8 if necessary.
    pub fn to_text(&self) -> Result<&str> {
        match self {
            Message::Text(string) => Ok(string.as_str()),
            Message::Binary(data) | Message::Ping(data) | Message::Pong(data) => {
                Ok(std::str::from_utf8(data)?)
            }
            _ => Err(Error::Utf8),
        }
    }
}

impl From<String> for Message {
    fn from(string: String) -> Message {
        Message::text(string)
    }
}

impl<'s> From<&'s str> for Message {
    fn from(string: &'s str) -> Message {
        Message::text(string)
    }
}

impl<'b> From<&'b [u8]> for Message {
    fn from(data: &'b [u8]) -> Message {
        Message::binary(data.to_vec())
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Message {
        Message::binary(data)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_text() {
            Ok(string) => write!(f, "{}", string),
            Err(_) => write!(f, "Binary Data<length={}>", self.len()),
        }
    }
}

/// The type of message an [`IncompleteMessage`] is accumulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteMessageType {
    /// A fragmented text message.
    Text,
    /// A fragmented binary message.
    Binary,
}

/// Accumulates the fragments of a message that arrived across multiple
/// continuation frames.
#[derive(Debug)]
pub struct IncompleteMessage {
    collector: IncompleteMessageCollector,
}

#[derive(Debug)]
enum IncompleteMessageCollector {
    Text(Vec<u8>),
    Binary(Vec<u8>),
}

impl IncompleteMessage {
    /// Start accumulating a new incomplete message of the given type.
    pub fn new(message_type: IncompleteMessageType) -> Self {
        IncompleteMessage {
            collector: match message_type {
                IncompleteMessageType::Binary => IncompleteMessageCollector::Binary(Vec::new()),
                IncompleteMessageType::Text => IncompleteMessageCollector::Text(Vec::new()),
            },
        }
    }

    /// Add more data to an existing incomplete message, failing once the
    /// accumulated size would exceed `max_size` (`None` means unbounded).
    pub fn extend<T: AsRef<[u8]>>(&mut self, tail: T, max_size: Option<usize>) -> Result<()> {
        let bytes = tail.as_ref();
        let (buf, size) = match &mut self.collector {
            IncompleteMessageCollector::Binary(v) | IncompleteMessageCollector::Text(v) => {
                (v, bytes.len())
            }
        };

        if let Some(max_size) = max_size {
            if buf.len() + size > max_size {
                return Err(Error::Capacity(CapacityError::MessageTooLong {
                    size: buf.len() + size,
                    max_size,
                }));
            }
        }

        buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Convert an incomplete message into a complete one.
    pub fn complete(self) -> Result<Message> {
        match self.collector {
            IncompleteMessageCollector::Binary(v) => Ok(Message::Binary(v.into())),
            IncompleteMessageCollector::Text(v) => {
                let text = Utf8Bytes::try_from(v)?;
                Ok(Message::Text(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let t = Message::text("test".to_string());
        assert_eq!(t.to_string(), "test".to_owned());

        let bin = Message::binary(vec![0, 1, 3, 4, 241]);
        assert_eq!(bin.to_string(), "Binary Data<length=5>".to_owned());
    }

    #[test]
    fn binary_convert() {
        let bin = [6u8, 7, 8, 9, 10, 241];
        let msg = Message::from(&bin[..]);
        assert!(msg.is_binary());
        assert!(msg.into_text().is_err());
    }

    #[test]
    fn text_convert() {
        let s = "kiwotsukete";
        let msg = Message::from(s);
        assert!(msg.is_text());
    }

    #[test]
    fn incomplete_message_rejects_oversize() {
        let mut msg = IncompleteMessage::new(IncompleteMessageType::Binary);
        assert!(msg.extend([0u8; 4], Some(2)).is_err());
    }

    #[test]
    fn incomplete_message_accumulates_fragments() {
        let mut msg = IncompleteMessage::new(IncompleteMessageType::Text);
        msg.extend(b"Hel", None).unwrap();
        msg.extend(b"lo", None).unwrap();
        assert_eq!(msg.complete().unwrap(), Message::text("Hello"));
    }
}
