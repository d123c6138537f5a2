//! Verifies that an inbound ping is answered with an automatic pong without
//! the caller doing anything beyond draining `recv`: the reader thread
//! queues the pong on the writer thread's behalf as soon as it dispatches
//! the ping frame.

#![cfg(feature = "handshake")]

mod support;

use wsconn::protocol::frame::coding::{Control, OpCode};
use wsconn::protocol::frame::Frame;
use wsconn::ConnectionManager;

#[test]
fn ping_is_answered_with_automatic_pong() {
    let (port, join) = support::spawn_ws_server(
        |_request| Vec::new(),
        |mut socket| {
            socket.send(Frame::ping(&b"ping-payload"[..])).unwrap();

            let frame = socket.read(None).unwrap().unwrap();
            assert_eq!(frame.header().opcode, OpCode::Control(Control::Pong));
            assert_eq!(frame.payload().as_ref(), b"ping-payload");

            socket.send(Frame::close(None)).unwrap();
            let _ = socket.read(None); // drain the client's close ack
        },
    );

    let connection =
        ConnectionManager::connect(format!("ws://127.0.0.1:{port}"), None, None).unwrap();

    // The ping/pong exchange is entirely internal to the reader/writer
    // threads; `recv` only ever surfaces reassembled data messages, so it
    // drains straight to `None` once the close handshake completes.
    assert!(connection.recv().is_none());

    join.join().unwrap();
}
