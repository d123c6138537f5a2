//! Verifies that the CREATED/CONNECTING/OPEN/CLOSING/CLOSED state machine
//! reaches CLOSED, and that the public API rejects further use afterwards,
//! for both a server-initiated and a client-initiated close handshake.

#![cfg(feature = "handshake")]

mod support;

use std::thread::sleep;
use std::time::Duration;

use bytes::Bytes;

use wsconn::protocol::frame::coding::{CloseCode, Control, Data, OpCode};
use wsconn::protocol::frame::{Frame, FrameHeader};
use wsconn::{ConnectionManager, ConnectionState, Error, Message};

fn wait_until_closed(connection: &wsconn::WebSocketConnection) {
    for _ in 0..100 {
        if connection.state() == ConnectionState::Closed {
            return;
        }
        sleep(Duration::from_millis(20));
    }
    panic!("connection did not reach CLOSED in time");
}

#[test]
fn test_server_close() {
    let (port, join) = support::spawn_ws_server(
        |_request| Vec::new(),
        |mut socket| {
            let frame = socket.read(None).unwrap().unwrap();
            assert_eq!(frame.into_payload().as_ref(), b"Hello WebSocket");
            socket.send(Frame::close(None)).unwrap();
            let _ = socket.read(None); // drain the client's close ack
        },
    );

    let connection =
        ConnectionManager::connect(format!("ws://127.0.0.1:{port}"), None, None).unwrap();
    connection.send(Message::text("Hello WebSocket")).unwrap();

    // The server never echoes data, only a close, so `recv` drains to `None`
    // once the reader thread exits on the close handshake.
    assert!(connection.recv().is_none());
    wait_until_closed(&connection);

    assert!(matches!(connection.send(Message::text("late")), Err(Error::AlreadyClosed)));

    join.join().unwrap();
}

#[test]
fn test_client_initiated_close() {
    let (port, join) = support::spawn_ws_server(
        |_request| Vec::new(),
        |mut socket| {
            socket
                .send(Frame::message(Bytes::from_static(b"From Server"), OpCode::Data(Data::Text), true))
                .unwrap();

            let frame = socket.read(None).unwrap().unwrap();
            assert!(matches!(frame.header().opcode, OpCode::Control(Control::Close)));
            let opcode = frame.header().opcode;
            socket
                .send(Frame::from_payload(
                    FrameHeader { opcode, ..Default::default() },
                    frame.into_payload(),
                ))
                .unwrap();
        },
    );

    let connection =
        ConnectionManager::connect(format!("ws://127.0.0.1:{port}"), None, None).unwrap();

    let message = connection.recv().unwrap();
    assert_eq!(message, Message::text("From Server"));

    connection.disconnect(CloseCode::Normal, "").unwrap();
    assert!(connection.recv().is_none());
    wait_until_closed(&connection);

    join.join().unwrap();
}
