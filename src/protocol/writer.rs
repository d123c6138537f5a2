//! WriterTask: drains an outbound frame queue onto the transport, honoring
//! ping/pong priority and the close-frame latch.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

use log::*;

use crate::error::{Error, Result};
use crate::extensions::compression::CompressionSwitcher;
use crate::extensions::WebSocketExtension;
use crate::protocol::frame::coding::{Control, OpCode};
use crate::protocol::frame::{CloseFrame, Frame, FrameSocket};
use crate::protocol::{Message, FLUSH_THRESHOLD};

/// One entry in the outbound queue.
#[derive(Debug)]
enum Outbound {
    Data(Frame),
    Priority(Frame),
    FlushRequest,
}

#[derive(Debug, Default)]
struct Queue {
    control: VecDeque<Frame>,
    data: VecDeque<Frame>,
    flush_requested: bool,
}

impl Queue {
    fn len(&self) -> usize {
        self.control.len() + self.data.len()
    }

    fn pop(&mut self) -> Option<Outbound> {
        if let Some(f) = self.control.pop_front() {
            return Some(Outbound::Priority(f));
        }
        if self.flush_requested && self.data.is_empty() {
            self.flush_requested = false;
            return Some(Outbound::FlushRequest);
        }
        self.data.pop_front().map(Outbound::Data)
    }
}

/// A cheap, cloneable handle used to queue frames for the writer thread
/// and to request cooperative shutdown.
#[derive(Debug, Clone)]
pub struct WriterHandle {
    queue: Arc<Mutex<Queue>>,
    condvar: Arc<Condvar>,
    stop_requested: Arc<AtomicBool>,
    close_frame_sent: Arc<AtomicBool>,
    outbound_queue_bound: Option<usize>,
}

impl WriterHandle {
    /// Queue a message for sending. Control-frame messages (ping/pong/
    /// close) bypass the back-pressure bound and jump ahead of data
    /// frames; everything else observes the configured bound, blocking
    /// the caller until space frees up.
    pub fn queue_message(&self, message: Message) -> Result<()> {
        if self.close_frame_sent.load(Ordering::SeqCst) {
            return Err(Error::SendQueueFull(message));
        }

        let frame = match message {
            Message::Text(data) => Frame::message(data, OpCode::Data(crate::protocol::frame::coding::Data::Text), true),
            Message::Binary(data) => Frame::message(data, OpCode::Data(crate::protocol::frame::coding::Data::Binary), true),
            Message::Ping(data) => return self.queue_control(Frame::ping(data)),
            Message::Pong(data) => return self.queue_control(Frame::pong(data)),
            Message::Close(frame) => return self.queue_close(frame),
            Message::Frame(frame) => frame,
        };

        self.queue_data(frame)
    }

    fn queue_control(&self, frame: Frame) -> Result<()> {
        let mut guard = self.queue.lock().expect("writer queue mutex poisoned");
        guard.control.push_back(frame);
        self.condvar.notify_all();
        Ok(())
    }

    /// Queue a close frame. Latches further sends to fail immediately.
    pub fn queue_close(&self, close: Option<CloseFrame>) -> Result<()> {
        let frame = Frame::close(close);
        let mut guard = self.queue.lock().expect("writer queue mutex poisoned");
        guard.control.push_back(frame);
        self.condvar.notify_all();
        Ok(())
    }

    fn queue_data(&self, frame: Frame) -> Result<()> {
        let mut guard = self.queue.lock().expect("writer queue mutex poisoned");
        if let Some(bound) = self.outbound_queue_bound {
            while guard.data.len() >= bound && !self.stop_requested.load(Ordering::SeqCst) {
                guard = self.condvar.wait(guard).expect("writer queue mutex poisoned");
            }
        }
        guard.data.push_back(frame);
        self.condvar.notify_all();
        Ok(())
    }

    /// Ask the writer to flush as soon as the queue drains.
    pub fn request_flush(&self) {
        let mut guard = self.queue.lock().expect("writer queue mutex poisoned");
        guard.flush_requested = true;
        self.condvar.notify_all();
    }

    /// Signal the writer loop to exit once it next wakes.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    /// Whether a close frame has already left the wire.
    pub fn close_frame_sent(&self) -> bool {
        self.close_frame_sent.load(Ordering::SeqCst)
    }
}

/// Drains the outbound queue onto the transport.
pub struct WriterTask<S> {
    socket: FrameSocket<S>,
    queue: Arc<Mutex<Queue>>,
    condvar: Arc<Condvar>,
    stop_requested: Arc<AtomicBool>,
    close_frame_sent: Arc<AtomicBool>,
    compression: Arc<Mutex<CompressionSwitcher>>,
    auto_flush: bool,
}

impl<S: Write> WriterTask<S> {
    /// Create a writer task plus the handle callers and the reader task
    /// use to queue frames.
    pub fn new(
        stream: S,
        compression: Arc<Mutex<CompressionSwitcher>>,
        outbound_queue_bound: Option<usize>,
        auto_flush: bool,
    ) -> (WriterTask<S>, WriterHandle) {
        Self::with_buffer_limits(stream, compression, outbound_queue_bound, auto_flush, 0, usize::MAX)
    }

    /// Like [`new`](Self::new), but also applies the `write_buffer_size`/
    /// `max_write_buffer_size` batching limits from a [`WebSocketConfig`](crate::protocol::WebSocketConfig).
    pub fn with_buffer_limits(
        stream: S,
        compression: Arc<Mutex<CompressionSwitcher>>,
        outbound_queue_bound: Option<usize>,
        auto_flush: bool,
        write_buffer_size: usize,
        max_write_buffer_size: usize,
    ) -> (WriterTask<S>, WriterHandle) {
        let queue = Arc::new(Mutex::new(Queue::default()));
        let condvar = Arc::new(Condvar::new());
        let stop_requested = Arc::new(AtomicBool::new(false));
        let close_frame_sent = Arc::new(AtomicBool::new(false));

        let handle = WriterHandle {
            queue: Arc::clone(&queue),
            condvar: Arc::clone(&condvar),
            stop_requested: Arc::clone(&stop_requested),
            close_frame_sent: Arc::clone(&close_frame_sent),
            outbound_queue_bound,
        };

        let mut socket = FrameSocket::new(stream);
        socket.set_buffer_limits(write_buffer_size, max_write_buffer_size);

        let task = WriterTask {
            socket,
            queue,
            condvar,
            stop_requested,
            close_frame_sent,
            compression,
            auto_flush,
        };

        (task, handle)
    }

    /// Run the writer loop until stopped or a close frame has been sent.
    /// Always attempts one final flush before returning.
    pub fn run(mut self) -> Result<()> {
        let result = self.run_inner();
        let _ = self.socket.flush();
        result
    }

    fn run_inner(&mut self) -> Result<()> {
        let mut last_flush = Instant::now();

        loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                return Ok(());
            }
            if self.close_frame_sent.load(Ordering::SeqCst) {
                return Ok(());
            }

            let item = {
                let mut guard = self.queue.lock().expect("writer queue mutex poisoned");
                loop {
                    if let Some(item) = guard.pop() {
                        break item;
                    }
                    if self.stop_requested.load(Ordering::SeqCst) {
                        return Ok(());
                    }
                    let (g, timeout) = self
                        .condvar
                        .wait_timeout(guard, FLUSH_THRESHOLD)
                        .expect("writer queue mutex poisoned");
                    guard = g;
                    if timeout.timed_out() && !guard.data.is_empty() {
                        self.socket.flush()?;
                        last_flush = Instant::now();
                    }
                }
            };

            match item {
                Outbound::FlushRequest => {
                    self.socket.flush()?;
                    last_flush = Instant::now();
                }
                Outbound::Priority(frame) => {
                    let is_close = frame.header().opcode == OpCode::Control(Control::Close);
                    self.write_frame(frame)?;
                    self.socket.flush()?;
                    last_flush = Instant::now();
                    if is_close {
                        self.close_frame_sent.store(true, Ordering::SeqCst);
                        trace!("writer: close frame sent, latching further sends");
                        return Ok(());
                    }
                }
                Outbound::Data(frame) => {
                    self.write_frame(frame)?;
                    if self.auto_flush || last_flush.elapsed() >= FLUSH_THRESHOLD {
                        self.socket.flush()?;
                        last_flush = Instant::now();
                    }
                }
            }
        }
    }

    fn write_frame(&mut self, frame: Frame) -> Result<()> {
        let mut frame = if frame.header().opcode.is_control() {
            frame
        } else {
            let mut compression = self.compression.lock().expect("compression mutex poisoned");
            compression.on_send_frame(frame)?
        };
        // 5. If the data is being sent by the client, the frame(s) MUST be
        // masked as defined in Section 5.3. (RFC 6455) This crate is
        // client-only, so every outbound frame gets a mask, control or not.
        frame.set_random_mask();
        self.socket.write(frame).map_err(|e| match e {
            Error::Io(io_err) => Error::IoErrorInWriting(io_err),
            other => other,
        })
    }
}
