//! ReaderTask: the blocking read loop that validates inbound frames,
//! reassembles messages, answers pings and the close handshake, and
//! hands completed messages to a listener callback.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::*;

use crate::error::{close_code_for_error, Error, ProtocolError, Result};
use crate::extensions::compression::CompressionSwitcher;
use crate::extensions::WebSocketExtension;
use crate::protocol::frame::coding::{Control, Data, OpCode};
use crate::protocol::frame::{CloseFrame, ExtensionHeaders, Frame, FrameSocket};
use crate::protocol::validator::{FrameValidator, ValidatorMode};
use crate::protocol::writer::WriterHandle;
use crate::protocol::Message;

/// Why the read loop stopped.
#[derive(Debug)]
pub enum ReaderExit {
    /// A close frame from the peer was received and echoed; `initiator`
    /// records who closed first.
    PeerClosed,
    /// The reader was asked to stop (cooperative shutdown).
    StopRequested,
    /// The transport ran out of data without a close handshake and the
    /// connection allows that (`accept_unmasked_frames`-style leniency
    /// is not this; this is strictly "no more frames, no close seen").
    NoMoreFrames,
    /// A fatal error terminated the loop; a close frame with the mapped
    /// code has already been queued with the writer, if possible.
    Failed(Error),
}

/// Reads frames from the transport, reassembles (and decompresses)
/// messages, and publishes each completed message via `on_message`.
pub struct ReaderTask<S> {
    socket: FrameSocket<S>,
    validator: FrameValidator,
    compression: Arc<Mutex<CompressionSwitcher>>,
    writer: WriterHandle,
    stop_requested: Arc<AtomicBool>,
    max_message_size: Option<usize>,
    max_frame_size: Option<usize>,
    allow_unclosed_eof: bool,
    accumulator: Vec<Vec<u8>>,
    accumulator_opcode: Option<Data>,
    accumulator_compressed: bool,
}

impl<S: Read> ReaderTask<S> {
    /// Construct a reader task sharing the compression extension state
    /// and connection-state writer handle with the writer task.
    pub fn new(
        stream: S,
        mode: ValidatorMode,
        compression_active: bool,
        compression: Arc<Mutex<CompressionSwitcher>>,
        writer: WriterHandle,
        max_message_size: Option<usize>,
        max_frame_size: Option<usize>,
        allow_unclosed_eof: bool,
    ) -> (ReaderTask<S>, Arc<AtomicBool>) {
        let stop_requested = Arc::new(AtomicBool::new(false));
        let task = ReaderTask {
            socket: FrameSocket::new(stream),
            validator: FrameValidator::new(mode, compression_active),
            compression,
            writer,
            stop_requested: Arc::clone(&stop_requested),
            max_message_size,
            max_frame_size,
            allow_unclosed_eof,
            accumulator: Vec::new(),
            accumulator_opcode: None,
            accumulator_compressed: false,
        };
        (task, stop_requested)
    }

    /// Ask the loop to stop. The caller should also arm a guard timer
    /// (via `close_delay`) that forcibly closes the transport if the
    /// blocking read doesn't unblock on its own.
    pub fn request_stop(stop_requested: &Arc<AtomicBool>) {
        stop_requested.store(true, Ordering::SeqCst);
    }

    /// Run the read loop, invoking `on_message` for every reassembled
    /// message, until the connection closes or an unrecoverable error
    /// occurs.
    pub fn run(mut self, mut on_message: impl FnMut(Message)) -> ReaderExit {
        loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                return ReaderExit::StopRequested;
            }

            let frame = match self.socket.read(self.max_frame_size) {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    if self.stop_requested.load(Ordering::SeqCst) {
                        return ReaderExit::StopRequested;
                    }
                    if self.allow_unclosed_eof {
                        return ReaderExit::NoMoreFrames;
                    }
                    return self.fail(Error::Protocol(ProtocolError::InsufficientData));
                }
                Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
                    if self.stop_requested.load(Ordering::SeqCst) {
                        return ReaderExit::StopRequested;
                    }
                    continue;
                }
                Err(Error::Io(e)) => return self.fail(Error::IoErrorInReading(e)),
                Err(e) => return self.fail(e),
            };

            if let Err(e) = self.validator.validate(frame.header(), frame.payload().len()) {
                return self.fail(e);
            }

            match self.dispatch(frame, &mut on_message) {
                Ok(true) => return ReaderExit::PeerClosed,
                Ok(false) => continue,
                Err(e) => return self.fail(e),
            }
        }
    }

    /// Dispatches one validated frame. Returns `Ok(true)` once a close
    /// frame has been observed and echoed.
    fn dispatch(&mut self, frame: Frame, on_message: &mut impl FnMut(Message)) -> Result<bool> {
        match frame.header().opcode {
            OpCode::Control(Control::Ping) => {
                let payload = frame.into_payload();
                let _ = self.writer.queue_message(Message::Pong(payload));
                Ok(false)
            }
            OpCode::Control(Control::Pong) => Ok(false),
            OpCode::Control(Control::Close) => {
                let close = frame.into_close()?;
                let _ = self.writer.queue_close(close);
                Ok(true)
            }
            OpCode::Control(Control::Reserved(i)) => {
                Err(Error::Protocol(ProtocolError::UnknownControlFrameType(i)))
            }
            OpCode::Data(data_opcode) => {
                let is_final = frame.header().is_final;
                let headers = ExtensionHeaders::from(frame.header());
                let payload = frame.into_payload().to_vec();

                if matches!(data_opcode, Data::Continue) {
                    self.accumulate(payload, is_final, on_message)
                } else if !self.accumulator.is_empty() || self.accumulator_opcode.is_some() {
                    Err(Error::Protocol(ProtocolError::ContinuationNotClosed))
                } else if is_final {
                    self.emit(data_opcode, headers, payload, on_message)
                } else {
                    self.accumulator_opcode = Some(data_opcode);
                    self.accumulator_compressed = headers.rsv1;
                    self.accumulator.push(payload);
                    Ok(false)
                }
            }
        }
    }

    fn accumulate(
        &mut self,
        payload: Vec<u8>,
        is_final: bool,
        on_message: &mut impl FnMut(Message),
    ) -> Result<bool> {
        self.accumulator.push(payload);
        if !is_final {
            return Ok(false);
        }

        let opcode = self.accumulator_opcode.take().expect("validator guarantees open fragment");
        let compressed = self.accumulator_compressed;
        self.accumulator_compressed = false;

        let total: usize = self.accumulator.iter().map(Vec::len).sum();
        if let Some(max) = self.max_message_size {
            if total > max {
                self.accumulator.clear();
                return Err(Error::Protocol(ProtocolError::TooLongPayload));
            }
        }

        let mut concatenated = Vec::with_capacity(total);
        for chunk in self.accumulator.drain(..) {
            concatenated.extend_from_slice(&chunk);
        }

        let headers = ExtensionHeaders { rsv1: compressed, rsv2: false, rsv3: false };
        self.emit(opcode, headers, concatenated, on_message)
    }

    fn emit(
        &mut self,
        opcode: Data,
        headers: ExtensionHeaders,
        payload: Vec<u8>,
        on_message: &mut impl FnMut(Message),
    ) -> Result<bool> {
        let message = {
            let mut compression = self.compression.lock().expect("compression mutex poisoned");
            compression.on_receive_frame(opcode, true, headers, payload)?
        };
        if let Some(message) = message {
            on_message(message);
        }
        Ok(false)
    }

    fn fail(&mut self, err: Error) -> ReaderExit {
        if self.stop_requested.load(Ordering::SeqCst) {
            if let Error::Io(_) | Error::IoErrorInReading(_) = err {
                return ReaderExit::StopRequested;
            }
        }
        let code = close_code_for_error(&err);
        let close = CloseFrame { code, reason: format!("{}", err).into() };
        let _ = self.writer.queue_close(Some(close));
        warn!("reader: closing connection after error: {}", err);
        ReaderExit::Failed(err)
    }
}

/// Blocks the calling thread for up to `close_delay`, returning once a
/// close frame has arrived or the guard expires. `has_close` is polled
/// rather than awaited on a condvar to keep this usable whether or not
/// the reader thread has already exited.
pub fn await_close_or_timeout(has_close: impl Fn() -> bool, close_delay: Duration) {
    let deadline = Instant::now() + close_delay;
    while !has_close() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
}
