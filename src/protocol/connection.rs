//! Client connection lifecycle: resolves a URI (through a proxy and TLS if
//! needed), performs the opening handshake, and owns the reader/writer
//! threads and the state machine once the socket is open.

use std::io::Cursor;
use std::net::ToSocketAddrs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::*;

use crate::client::{connect_to_some, uri_mode, AutoStream, IntoClientRequest};
use crate::error::{Error, Result, UrlError};
use crate::extensions::compression::{CompressionSwitcher, WsCompression};
use crate::handshake::client::Response;
use crate::handshake::HandshakeError;
use crate::protocol::frame::coding::CloseCode;
use crate::protocol::frame::CloseFrame;
use crate::protocol::reader::{await_close_or_timeout, ReaderExit, ReaderTask};
use crate::protocol::writer::{WriterHandle, WriterTask};
use crate::protocol::{Message, SharedStream, WebSocketConfig};
use crate::proxy;
use crate::stream::NoDelay;
use crate::tls;

/// Lifecycle state of a connection, following exactly the CREATED ->
/// CONNECTING -> OPEN -> CLOSING -> CLOSED progression: `connect()` moves
/// CREATED to CONNECTING, then to OPEN on a successful handshake or CLOSED
/// on failure; `disconnect()` or either side of the close handshake moves
/// OPEN to CLOSING; CLOSED is entered once both worker threads have exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed but not yet connected.
    Created,
    /// Resolving the address, negotiating TLS, and running the HTTP handshake.
    Connecting,
    /// Handshake complete; the reader and writer threads are running.
    Open,
    /// A close frame has been sent or received; draining in progress.
    Closing,
    /// Both worker threads have exited and the transport is closed.
    Closed,
}

type StateListener = Arc<dyn Fn(ConnectionState) + Send + Sync>;

fn notify_state(
    state: &Arc<Mutex<ConnectionState>>,
    listener: &Option<StateListener>,
    new: ConnectionState,
) {
    *state.lock().expect("connection state mutex poisoned") = new;
    if let Some(cb) = listener {
        let cb = Arc::clone(cb);
        if let Err(payload) = catch_unwind(AssertUnwindSafe(move || cb(new))) {
            handle_callback_error(payload);
        }
    }
}

/// Logs and swallows a panic raised from a user-supplied state-change
/// listener, so a misbehaving callback can't take down a worker thread.
fn handle_callback_error(payload: Box<dyn std::any::Any + Send>) {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    error!("connection state listener panicked: {message}");
}

/// Establishes client WebSocket connections.
///
/// This is a namespace, not a value (it has no variants and is never
/// constructed): `ConnectionManager::connect` is the single entry point,
/// returning the live [`WebSocketConnection`] handle.
pub enum ConnectionManager {}

impl ConnectionManager {
    /// Resolve `request`'s URI (through an environment-configured proxy if
    /// present), establish TCP (and TLS, if the scheme calls for it),
    /// perform the opening HTTP handshake, and spawn the reader/writer
    /// threads.
    ///
    /// `listener`, if given, is invoked (from whichever thread causes the
    /// transition) on every state change; panics inside it are caught and
    /// logged rather than propagated.
    pub fn connect<Req: IntoClientRequest>(
        request: Req,
        config: Option<WebSocketConfig>,
        listener: Option<StateListener>,
    ) -> Result<WebSocketConnection> {
        let state = Arc::new(Mutex::new(ConnectionState::Created));
        notify_state(&state, &listener, ConnectionState::Connecting);

        let established = Self::establish(request, config);
        let (websocket, response) = match established {
            Ok(pair) => pair,
            Err(e) => {
                notify_state(&state, &listener, ConnectionState::Closed);
                return Err(e);
            }
        };

        notify_state(&state, &listener, ConnectionState::Open);

        let (stream, tail, config) = websocket.into_parts();
        let (reader_half, writer_half) = SharedStream::split(stream);

        let compression_active = !matches!(config.compression, WsCompression::None(_));
        let compression = Arc::new(Mutex::new(CompressionSwitcher::from_config(config.compression)));

        let (writer_task, writer_handle) = WriterTask::with_buffer_limits(
            writer_half,
            Arc::clone(&compression),
            config.outbound_queue_bound,
            config.auto_flush,
            config.write_buffer_size,
            config.max_write_buffer_size,
        );

        let (reader_task, reader_stop) = ReaderTask::new(
            Cursor::new(tail).chain(reader_half),
            config.validator_mode,
            compression_active,
            compression,
            writer_handle.clone(),
            config.max_message_size,
            config.max_frame_size,
            false,
        );

        let (tx, rx) = mpsc::channel();

        let writer_thread = thread::Builder::new()
            .name("ws-writer".into())
            .spawn(move || {
                if let Err(e) = writer_task.run() {
                    error!("ws-writer exited with error: {e}");
                }
            })
            .expect("failed to spawn ws-writer thread");

        let reader_state = Arc::clone(&state);
        let reader_listener = listener.clone();
        let reader_writer_handle = writer_handle.clone();
        let close_delay = config.close_delay;

        let reader_thread = thread::Builder::new()
            .name("ws-reader".into())
            .spawn(move || {
                let exit = reader_task.run(move |message| {
                    let _ = tx.send(message);
                });

                notify_state(&reader_state, &reader_listener, ConnectionState::Closing);

                // `PeerClosed`/`Failed` already queued a close frame (the
                // reader's own dispatch/fail path did it); let the writer
                // drain and send it rather than racing a stop against it.
                // `NoMoreFrames` means the peer vanished without a close
                // frame ever entering the queue, so the writer has to be
                // told explicitly or it would wait forever.
                if matches!(exit, ReaderExit::NoMoreFrames) {
                    reader_writer_handle.request_stop();
                }

                await_close_or_timeout(|| reader_writer_handle.close_frame_sent(), close_delay);

                if let Err(e) = writer_thread.join() {
                    error!("ws-writer thread panicked: {e:?}");
                }

                notify_state(&reader_state, &reader_listener, ConnectionState::Closed);

                if let ReaderExit::Failed(e) = exit {
                    debug!("ws-reader exited with error: {e}");
                }
            })
            .expect("failed to spawn ws-reader thread");

        Ok(WebSocketConnection {
            state,
            listener,
            writer: writer_handle,
            reader_stop,
            close_delay: config.close_delay,
            inbound: rx,
            reader_thread: Some(reader_thread),
            response,
        })
    }

    fn establish<Req: IntoClientRequest>(
        request: Req,
        config: Option<WebSocketConfig>,
    ) -> Result<(crate::WebSocket<AutoStream>, Response)> {
        let request = request.into_client_request()?;
        let uri = request.uri().clone();
        let mode = uri_mode(&uri)?;
        let host = uri.host().ok_or(Error::Url(UrlError::NoHostName))?;
        let port = uri.port_u16().unwrap_or(match mode {
            crate::stream::Mode::Plain => 80,
            crate::stream::Mode::Tls => 443,
        });

        let mut stream = match proxy::connect_proxy_stream(&uri, host, port)? {
            Some(stream) => stream,
            None => {
                let addrs: Vec<_> = (host, port).to_socket_addrs()?.collect();
                connect_to_some(&addrs, &uri)?
            }
        };
        NoDelay::set_nodelay(&mut stream, true)?;

        tls::client_tls_with_config(request, stream, config, None).map_err(|e| match e {
            HandshakeError::Failure(f) => f,
            HandshakeError::Interrupted(_) => panic!("Bug: blocking handshake not blocked"),
        })
    }
}

/// A live client connection: send and receive messages, watch the
/// connection state, and drive the close handshake.
#[allow(missing_debug_implementations)]
pub struct WebSocketConnection {
    state: Arc<Mutex<ConnectionState>>,
    listener: Option<StateListener>,
    writer: WriterHandle,
    reader_stop: Arc<AtomicBool>,
    close_delay: Duration,
    inbound: Receiver<Message>,
    reader_thread: Option<JoinHandle<()>>,
    response: Response,
}

impl WebSocketConnection {
    /// The current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().expect("connection state mutex poisoned")
    }

    /// The HTTP response from the opening handshake.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Queue a message for the writer thread. Blocks the caller if the
    /// outbound back-pressure bound is hit on a data frame; control frames
    /// always bypass the bound.
    pub fn send(&self, message: Message) -> Result<()> {
        if self.state() == ConnectionState::Closed {
            return Err(Error::AlreadyClosed);
        }
        self.writer.queue_message(message)
    }

    /// Block until the next reassembled message arrives, or return `None`
    /// once the reader has exited and no message remains buffered.
    pub fn recv(&self) -> Option<Message> {
        self.inbound.recv().ok()
    }

    /// Return the next already-buffered message without blocking.
    pub fn try_recv(&self) -> Result<Option<Message>> {
        match self.inbound.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                if self.state() == ConnectionState::Closed {
                    Err(Error::AlreadyClosed)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Initiate the close handshake: queue a close frame and ask the
    /// reader to stop once its guard timer (`close_delay`) expires without
    /// a reply.
    pub fn disconnect(&self, code: CloseCode, reason: impl Into<crate::protocol::frame::Utf8Bytes>) -> Result<()> {
        if self.state() == ConnectionState::Closed {
            return Err(Error::AlreadyClosed);
        }
        self.writer.queue_close(Some(CloseFrame { code, reason: reason.into() }))?;
        self.reader_stop.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    /// Block until both worker threads have exited.
    pub fn join(&mut self) {
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        if self.state() != ConnectionState::Closed {
            let _ = self.disconnect(CloseCode::Normal, "");
            await_close_or_timeout(|| self.state() == ConnectionState::Closed, self.close_delay);
        }
    }
}
